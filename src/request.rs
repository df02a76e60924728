//! Inference request builder
//!
//! Turns a customer profile from the dashboard form into a feature-name ->
//! value map using the encoding contract, then aligns it to the feature list.

use crate::encoding::EncodingContract;
use crate::error::{PredictorError, Result};
use crate::features::FeatureList;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const AGE: &str = "Age";
pub const TYPE_OF_CONTACT: &str = "TypeofContact";
pub const CITY_TIER: &str = "CityTier";
pub const DURATION_OF_PITCH: &str = "DurationOfPitch";
pub const OCCUPATION: &str = "Occupation";
pub const GENDER: &str = "Gender";
pub const MARITAL_STATUS: &str = "MaritalStatus";
pub const NUMBER_OF_TRIPS: &str = "NumberOfTrips";
pub const PASSPORT: &str = "Passport";
pub const OWN_CAR: &str = "OwnCar";
pub const DESIGNATION: &str = "Designation";
pub const MONTHLY_INCOME: &str = "MonthlyIncome";

/// Text fields the form offers as selectors, in form order
pub const CATEGORICAL_FIELDS: [&str; 5] = [GENDER, MARITAL_STATUS, TYPE_OF_CONTACT, OCCUPATION, DESIGNATION];

/// Inclusive bounds of the numeric form inputs
pub const AGE_RANGE: (u32, u32) = (18, 70);
pub const INCOME_RANGE: (u32, u32) = (1_000, 100_000);
pub const PITCH_RANGE: (u32, u32) = (5, 120);
pub const TRIPS_RANGE: (u32, u32) = (1, 20);
pub const CITY_TIER_RANGE: (u32, u32) = (1, 3);

/// Training features the form does not collect, pinned to a typical customer.
///
/// This biases every prediction toward that profile. `ProductPitched` is an
/// already-encoded code, not a label.
pub const UNCOLLECTED_DEFAULTS: [(&str, f64); 6] = [
    ("NumberOfPersonVisiting", 2.0),
    ("NumberOfFollowups", 3.0),
    ("ProductPitched", 1.0),
    ("PreferredPropertyStar", 3.0),
    ("PitchSatisfactionScore", 3.0),
    ("NumberOfChildrenVisiting", 1.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum YesNo {
    #[default]
    No,
    Yes,
}

impl YesNo {
    pub fn as_flag(self) -> f64 {
        match self {
            YesNo::Yes => 1.0,
            YesNo::No => 0.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            YesNo::Yes => "Yes",
            YesNo::No => "No",
        }
    }
}

/// One customer as entered in the dashboard form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub age: u32,
    pub gender: String,
    pub marital_status: String,
    pub monthly_income: u32,
    pub type_of_contact: String,
    pub city_tier: u32,
    pub duration_of_pitch: u32,
    pub number_of_trips: u32,
    pub occupation: String,
    pub designation: String,
    pub passport: YesNo,
    pub own_car: YesNo,
}

fn check_range(field: &str, value: u32, (min, max): (u32, u32)) -> Result<f64> {
    if value < min || value > max {
        return Err(PredictorError::OutOfRange {
            field: field.to_string(),
            value: value as f64,
            min: min as f64,
            max: max as f64,
        });
    }
    Ok(value as f64)
}

impl CustomerProfile {
    /// Label entered for one of [`CATEGORICAL_FIELDS`]
    pub fn label(&self, field: &str) -> Option<&str> {
        match field {
            GENDER => Some(&self.gender),
            MARITAL_STATUS => Some(&self.marital_status),
            TYPE_OF_CONTACT => Some(&self.type_of_contact),
            OCCUPATION => Some(&self.occupation),
            DESIGNATION => Some(&self.designation),
            _ => None,
        }
    }

    /// Feature values keyed by training column name
    pub fn feature_values(&self, contract: &EncodingContract) -> Result<HashMap<String, f64>> {
        let mut values = HashMap::new();

        values.insert(AGE.to_string(), check_range(AGE, self.age, AGE_RANGE)?);
        values.insert(
            MONTHLY_INCOME.to_string(),
            check_range(MONTHLY_INCOME, self.monthly_income, INCOME_RANGE)?,
        );
        values.insert(
            DURATION_OF_PITCH.to_string(),
            check_range(DURATION_OF_PITCH, self.duration_of_pitch, PITCH_RANGE)?,
        );
        values.insert(
            NUMBER_OF_TRIPS.to_string(),
            check_range(NUMBER_OF_TRIPS, self.number_of_trips, TRIPS_RANGE)?,
        );
        values.insert(CITY_TIER.to_string(), check_range(CITY_TIER, self.city_tier, CITY_TIER_RANGE)?);

        for field in CATEGORICAL_FIELDS {
            let label = self.label(field).unwrap_or_default();
            values.insert(field.to_string(), contract.encode(field, label)? as f64);
        }

        values.insert(PASSPORT.to_string(), self.passport.as_flag());
        values.insert(OWN_CAR.to_string(), self.own_car.as_flag());

        for (name, value) in UNCOLLECTED_DEFAULTS {
            values.insert(name.to_string(), value);
        }

        Ok(values)
    }

    /// One-row matrix in feature-list order
    pub fn to_row(&self, contract: &EncodingContract, features: &FeatureList) -> Result<Array2<f64>> {
        features.align_row(&self.feature_values(contract)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tourism_contract() -> EncodingContract {
        EncodingContract::from_fields([
            (GENDER, vec!["Female", "Male"]),
            (TYPE_OF_CONTACT, vec!["Company Invited", "Self Enquiry"]),
            (MARITAL_STATUS, vec!["Divorced", "Married", "Single"]),
            (OCCUPATION, vec!["Free Lancer", "Large Business", "Salaried", "Small Business"]),
            (DESIGNATION, vec!["AVP", "Executive", "Manager", "Senior Manager", "VP"]),
            ("ProductPitched", vec!["Basic", "Deluxe", "King", "Standard", "Super Deluxe"]),
        ])
    }

    fn training_features() -> FeatureList {
        FeatureList::new(
            [
                "Age",
                "TypeofContact",
                "CityTier",
                "DurationOfPitch",
                "Occupation",
                "Gender",
                "NumberOfPersonVisiting",
                "NumberOfFollowups",
                "ProductPitched",
                "PreferredPropertyStar",
                "MaritalStatus",
                "NumberOfTrips",
                "Passport",
                "PitchSatisfactionScore",
                "OwnCar",
                "NumberOfChildrenVisiting",
                "Designation",
                "MonthlyIncome",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        )
        .unwrap()
    }

    fn sample_profile() -> CustomerProfile {
        CustomerProfile {
            age: 30,
            gender: "Male".to_string(),
            marital_status: "Married".to_string(),
            monthly_income: 25000,
            type_of_contact: "Self Enquiry".to_string(),
            city_tier: 2,
            duration_of_pitch: 15,
            number_of_trips: 3,
            occupation: "Salaried".to_string(),
            designation: "Manager".to_string(),
            passport: YesNo::Yes,
            own_car: YesNo::No,
        }
    }

    #[test]
    fn test_sample_customer_row() {
        let features = training_features();
        let row = sample_profile().to_row(&tourism_contract(), &features).unwrap();
        assert_eq!(row.dim(), (1, features.len()));

        let at = |name: &str| row[[0, features.position(name).unwrap()]];
        assert_eq!(at("Passport"), 1.0);
        assert_eq!(at("OwnCar"), 0.0);
        assert_eq!(at("Occupation"), 2.0);
        assert_eq!(at("Designation"), 2.0);
        assert_eq!(at("TypeofContact"), 1.0);
        assert_eq!(at("Age"), 30.0);
        assert_eq!(at("MonthlyIncome"), 25000.0);
        assert_eq!(at("CityTier"), 2.0);
        assert_eq!(at("NumberOfFollowups"), 3.0);
        assert_eq!(at("ProductPitched"), 1.0);
    }

    #[test]
    fn test_unknown_label_fails() {
        let mut profile = sample_profile();
        profile.designation = "Intern".to_string();
        let err = profile.to_row(&tourism_contract(), &training_features()).unwrap_err();
        assert!(matches!(err, PredictorError::UnknownCategory { ref field, .. } if field == DESIGNATION));
    }

    #[test]
    fn test_out_of_range_inputs() {
        let contract = tourism_contract();

        let mut young = sample_profile();
        young.age = 17;
        assert!(matches!(
            young.feature_values(&contract),
            Err(PredictorError::OutOfRange { ref field, .. }) if field == AGE
        ));

        let mut tier = sample_profile();
        tier.city_tier = 4;
        assert!(tier.feature_values(&contract).is_err());

        let mut edge = sample_profile();
        edge.age = 70;
        edge.monthly_income = 1000;
        edge.duration_of_pitch = 120;
        edge.number_of_trips = 20;
        assert!(edge.feature_values(&contract).is_ok());
    }

    #[test]
    fn test_feature_added_to_training_but_not_form() {
        let mut names = training_features().names().to_vec();
        names.push("NewSignal".to_string());
        let features = FeatureList::new(names).unwrap();

        let err = sample_profile().to_row(&tourism_contract(), &features).unwrap_err();
        assert!(matches!(err, PredictorError::MissingFeature { ref feature, .. } if feature == "NewSignal"));
    }

    #[test]
    fn test_profile_from_json() {
        let profile: CustomerProfile = serde_json::from_value(serde_json::json!({
            "age": 30, "gender": "Female", "marital_status": "Single", "monthly_income": 25000,
            "type_of_contact": "Company Invited", "city_tier": 1, "duration_of_pitch": 15,
            "number_of_trips": 3, "occupation": "Free Lancer", "designation": "VP",
            "passport": "No", "own_car": "Yes"
        }))
        .unwrap();
        assert_eq!(profile.own_car, YesNo::Yes);
        assert_eq!(profile.passport, YesNo::No);
        assert_eq!(profile.label(OCCUPATION), Some("Free Lancer"));
        assert_eq!(profile.label("Age"), None);
    }
}
