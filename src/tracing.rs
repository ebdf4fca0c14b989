use crate::Status;
use tracing::{info, level_filters::LevelFilter, Level};
use tracing_subscriber::{
    fmt::writer::MakeWriterExt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

pub struct Tracing;

impl Tracing {
    /// Logs INFO and above to stderr, keeping stdout free for the chat
    /// transcript.
    pub fn setup(name: &str) -> Result<(), Status> {
        Self::setup_with_level(name, Level::INFO)
    }

    pub fn setup_with_level(name: &str, level: Level) -> Result<(), Status> {
        match tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::Layer::new()
                    .with_writer(std::io::stderr.with_max_level(level))
                    .with_filter(LevelFilter::from_level(level)),
            )
            .try_init()
        {
            Ok(()) => {
                info!("'{name}' tracing started");
                Ok(())
            }
            Err(e) => {
                eprintln!("{e}");
                Err(Status::new("Failed to setup tracing", e))
            }
        }
    }

    /// Parses a level name such as "debug" or "WARN".
    pub fn parse_level(level: &str) -> Result<Level, Status> {
        level
            .parse::<Level>()
            .map_err(|e| Status::invalid_argument(format!("Bad log level '{level}': {e}")))
    }
}
