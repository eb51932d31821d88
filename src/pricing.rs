use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideType {
    Economy,
    #[default]
    Standard,
    Premium,
}

/// Fare estimate range in major currency units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FareRange {
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RideTypeInfo {
    pub ride_type: RideType,
    pub name: &'static str,
    pub description: &'static str,
    pub fare: FareRange,
    pub eta: &'static str,
}

impl RideType {
    pub const ALL: [RideType; 3] = [RideType::Economy, RideType::Standard, RideType::Premium];

    pub fn fare_range(&self) -> FareRange {
        match self {
            RideType::Economy => FareRange { min: 12, max: 15 },
            RideType::Standard => FareRange { min: 18, max: 22 },
            RideType::Premium => FareRange { min: 25, max: 30 },
        }
    }

    /// Estimated pickup time shown while booking
    pub fn pickup_eta(&self) -> &'static str {
        match self {
            RideType::Economy => "10 min",
            RideType::Standard => "5 min",
            RideType::Premium => "8 min",
        }
    }

    pub fn info(&self) -> RideTypeInfo {
        let (name, description) = match self {
            RideType::Economy => ("Economy", "Affordable, everyday rides"),
            RideType::Standard => ("Standard", "Comfortable rides, more space"),
            RideType::Premium => ("Premium", "High-end cars with top drivers"),
        };

        RideTypeInfo {
            ride_type: *self,
            name,
            description,
            fare: self.fare_range(),
            eta: self.pickup_eta(),
        }
    }
}
