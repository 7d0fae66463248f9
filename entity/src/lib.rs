//! sea-orm models for the hospital back office.

pub mod centers;
pub mod cities;
pub mod diseases;
pub mod doctors;
pub mod medicines;
pub mod patient_diseases;
pub mod patients;
pub mod reports;
pub mod sessions;
pub mod staff;
pub mod surgeries;
pub mod treatments;
pub mod users;
pub mod visits;
