pub use sea_orm_migration::prelude::*;

mod m20250301_000001_directory;
mod m20250301_000002_patient_records;
mod m20250301_000003_sessions_and_reports;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_directory::Migration),
            Box::new(m20250301_000002_patient_records::Migration),
            Box::new(m20250301_000003_sessions_and_reports::Migration),
        ]
    }
}
