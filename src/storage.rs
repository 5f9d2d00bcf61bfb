//!
//! traingate entity directory
//! --------------------------
//! In-memory tables for trainees, trainers and trainings. Persistence across
//! restarts is out of scope; the directory is rebuilt from seed data at
//! startup. Each table sits behind its own `RwLock` so reads on one entity
//! kind never contend with writes on another.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::domain::{Trainee, Trainer, Training};

#[derive(Debug, Default)]
pub struct Directory {
    trainees: RwLock<HashMap<String, Trainee>>,
    trainers: RwLock<HashMap<String, Trainer>>,
    trainings: RwLock<HashMap<Uuid, Training>>,
}

/// Shared handle cloned into every request handler.
#[derive(Debug, Clone, Default)]
pub struct SharedDirectory(pub Arc<Directory>);

impl SharedDirectory {
    pub fn new() -> Self {
        Self(Arc::new(Directory::default()))
    }
}

impl Directory {
    pub fn is_empty(&self) -> bool {
        self.trainees.read().is_empty()
            && self.trainers.read().is_empty()
            && self.trainings.read().is_empty()
    }

    pub fn insert_trainee(&self, trainee: Trainee) {
        self.trainees.write().insert(trainee.username.clone(), trainee);
    }

    pub fn trainee(&self, username: &str) -> Option<Trainee> {
        self.trainees.read().get(username).cloned()
    }

    pub fn trainees(&self) -> Vec<Trainee> {
        self.trainees.read().values().cloned().collect()
    }

    /// Apply `apply` to the trainee under a single write lock; returns the
    /// updated row or `None` when the username is unknown.
    pub fn update_trainee<F>(&self, username: &str, apply: F) -> Option<Trainee>
    where
        F: FnOnce(&mut Trainee),
    {
        let mut map = self.trainees.write();
        let trainee = map.get_mut(username)?;
        apply(trainee);
        Some(trainee.clone())
    }

    /// Remove the trainee and every training that references them.
    pub fn remove_trainee(&self, username: &str) -> bool {
        let removed = self.trainees.write().remove(username).is_some();
        if removed {
            self.trainings.write().retain(|_, t| t.trainee_username != username);
        }
        removed
    }

    pub fn insert_trainer(&self, trainer: Trainer) {
        self.trainers.write().insert(trainer.username.clone(), trainer);
    }

    pub fn trainer(&self, username: &str) -> Option<Trainer> {
        self.trainers.read().get(username).cloned()
    }

    pub fn trainers(&self) -> Vec<Trainer> {
        self.trainers.read().values().cloned().collect()
    }

    pub fn update_trainer<F>(&self, username: &str, apply: F) -> Option<Trainer>
    where
        F: FnOnce(&mut Trainer),
    {
        let mut map = self.trainers.write();
        let trainer = map.get_mut(username)?;
        apply(trainer);
        Some(trainer.clone())
    }

    /// Remove the trainer and every training that references them.
    pub fn remove_trainer(&self, username: &str) -> bool {
        let removed = self.trainers.write().remove(username).is_some();
        if removed {
            self.trainings.write().retain(|_, t| t.trainer_username != username);
        }
        removed
    }

    pub fn insert_training(&self, training: Training) {
        self.trainings.write().insert(training.id, training);
    }

    /// List trainings, optionally narrowed to a trainee and/or trainer.
    pub fn trainings(&self, trainee: Option<&str>, trainer: Option<&str>) -> Vec<Training> {
        self.trainings
            .read()
            .values()
            .filter(|t| trainee.map(|u| t.trainee_username == u).unwrap_or(true))
            .filter(|t| trainer.map(|u| t.trainer_username == u).unwrap_or(true))
            .cloned()
            .collect()
    }
}
