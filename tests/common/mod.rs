//! Shared fixtures for integration tests

#![allow(dead_code)]

use tourism_package_predictor::{CustomerProfile, YesNo};

pub const RAW_HEADER: &str = "Unnamed: 0,CustomerID,ProdTaken,Age,TypeofContact,CityTier,DurationOfPitch,\
Occupation,Gender,NumberOfPersonVisiting,NumberOfFollowups,ProductPitched,PreferredPropertyStar,\
MaritalStatus,NumberOfTrips,Passport,PitchSatisfactionScore,OwnCar,NumberOfChildrenVisiting,\
Designation,MonthlyIncome";

/// Synthetic export in the shape of the raw tourism table, typos and a gap included
pub fn raw_tourism_csv(n: usize) -> String {
    let genders = ["Male", "Female", "Fe Male"];
    let marital = ["Married", "Single", "Divorced", "Unmarried"];
    let contacts = ["Self Enquiry", "Company Invited"];
    let occupations = ["Salaried", "Small Business", "Large Business", "Free Lancer"];
    let designations = ["Executive", "Manager", "Senior Manager", "AVP", "VP"];
    let products = ["Basic", "Deluxe", "Standard", "Super Deluxe", "King"];

    let mut csv = format!("{RAW_HEADER}\n");
    for i in 0..n {
        let passport = (i % 3 == 0) as u8;
        let prod_taken = (passport == 1 || i % 7 == 0) as u8;
        let age = if i == 5 { String::new() } else { (20 + i % 45).to_string() };
        let row = [
            i.to_string(),
            (200_000 + i).to_string(),
            prod_taken.to_string(),
            age,
            contacts[i % 2].to_string(),
            (1 + i % 3).to_string(),
            (6 + (i * 7) % 30).to_string(),
            occupations[i % 4].to_string(),
            genders[i % 3].to_string(),
            (1 + i % 4).to_string(),
            (1 + i % 5).to_string(),
            products[i % 5].to_string(),
            (3 + i % 3).to_string(),
            marital[i % 4].to_string(),
            (1 + i % 8).to_string(),
            passport.to_string(),
            (1 + i % 5).to_string(),
            (i % 2).to_string(),
            (i % 3).to_string(),
            designations[i % 5].to_string(),
            (15_000 + (i * 733) % 20_000).to_string(),
        ];
        csv.push_str(&row.join(","));
        csv.push('\n');
    }
    csv
}

pub fn sample_profile() -> CustomerProfile {
    CustomerProfile {
        age: 30,
        gender: "Male".to_string(),
        marital_status: "Married".to_string(),
        monthly_income: 25_000,
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
