use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Trainee {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Trainer {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub specialization: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Training {
    pub id: Uuid,
    pub trainee_username: String,
    pub trainer_username: String,
    pub name: String,
    pub training_type: String,
    pub date: NaiveDate,
    pub duration_minutes: u32,
}
