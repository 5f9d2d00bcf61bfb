//! JSON bulk seeding. On a fresh start the directory is populated either from
//! an operator-supplied seed file or from the embedded demo data; accounts go
//! through the same issuance path as live registrations.

use std::path::Path;

use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::domain::{Trainee, Trainer, Training};
use crate::identity::{generate_password, generate_username};
use crate::security::UserStore;
use crate::storage::SharedDirectory;

const DEMO_SEED: &str = include_str!("../seed/demo.json");

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse seed data: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
pub struct SeedTrainer {
    pub first_name: String,
    pub last_name: String,
    pub specialization: String,
}

#[derive(Debug, Deserialize)]
pub struct SeedTrainee {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Trainings reference people by index into the `trainees`/`trainers` arrays,
/// since usernames only exist after issuance.
#[derive(Debug, Deserialize)]
pub struct SeedTraining {
    pub trainee: usize,
    pub trainer: usize,
    pub name: String,
    pub training_type: String,
    pub date: NaiveDate,
    pub duration_minutes: u32,
}

#[derive(Debug, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub trainers: Vec<SeedTrainer>,
    #[serde(default)]
    pub trainees: Vec<SeedTrainee>,
    #[serde(default)]
    pub trainings: Vec<SeedTraining>,
}

#[derive(Debug, Default)]
pub struct SeedReport {
    pub trainers: usize,
    pub trainees: usize,
    pub trainings: usize,
}

pub fn load_seed_file(path: &Path) -> Result<SeedData, SeedError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub fn demo_seed() -> Result<SeedData, SeedError> {
    Ok(serde_json::from_str(DEMO_SEED)?)
}

/// Register every seeded person through the credential issuer and insert the
/// referenced trainings. Generated passwords are logged once here so an
/// operator can log in to a freshly seeded instance.
pub fn apply_seed(data: &SeedData, directory: &SharedDirectory, users: &UserStore) -> Result<SeedReport> {
    let mut trainer_usernames = Vec::with_capacity(data.trainers.len());
    for t in &data.trainers {
        let existing = users.usernames();
        let username = generate_username(&t.first_name, &t.last_name, &existing);
        let password = generate_password()?;
        users.add_user(&username, &password)?;
        directory.0.insert_trainer(Trainer {
            id: Uuid::new_v4(),
            username: username.clone(),
            first_name: t.first_name.clone(),
            last_name: t.last_name.clone(),
            specialization: t.specialization.clone(),
        });
        info!("seed.account kind=trainer username={} password={}", username, password);
        trainer_usernames.push(username);
    }

    let mut trainee_usernames = Vec::with_capacity(data.trainees.len());
    for t in &data.trainees {
        let existing = users.usernames();
        let username = generate_username(&t.first_name, &t.last_name, &existing);
        let password = generate_password()?;
        users.add_user(&username, &password)?;
        directory.0.insert_trainee(Trainee {
            id: Uuid::new_v4(),
            username: username.clone(),
            first_name: t.first_name.clone(),
            last_name: t.last_name.clone(),
            date_of_birth: t.date_of_birth,
            address: t.address.clone(),
        });
        info!("seed.account kind=trainee username={} password={}", username, password);
        trainee_usernames.push(username);
    }

    for tr in &data.trainings {
        let Some(trainee_username) = trainee_usernames.get(tr.trainee) else {
            bail!("training '{}' references unknown trainee index {}", tr.name, tr.trainee);
        };
        let Some(trainer_username) = trainer_usernames.get(tr.trainer) else {
            bail!("training '{}' references unknown trainer index {}", tr.name, tr.trainer);
        };
        directory.0.insert_training(Training {
            id: Uuid::new_v4(),
            trainee_username: trainee_username.clone(),
            trainer_username: trainer_username.clone(),
            name: tr.name.clone(),
            training_type: tr.training_type.clone(),
            date: tr.date,
            duration_minutes: tr.duration_minutes,
        });
    }

    Ok(SeedReport {
        trainers: data.trainers.len(),
        trainees: data.trainees.len(),
        trainings: data.trainings.len(),
    })
}
