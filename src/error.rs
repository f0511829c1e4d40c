use crate::physics::particle::ParticleId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Illegal double registration: particle {0} was already started")]
    AlreadyStarted(ParticleId),

    #[error("Particle {0} was not registered as started before")]
    NotRegistered(ParticleId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Configuration serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}

pub type SimulationResult<T> = Result<T, SimulationError>;
