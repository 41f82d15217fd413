use crate::domain::player::MAX_LIVES;
use crate::domain::tuning::StageSettings;
use std::{env, fs, io, path::Path, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub fn http_port() -> u16 {
    env::var("STAGE_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001)
}

pub fn tick_interval() -> Duration {
    let hz = env::var("STAGE_TICK_RATE_HZ")
        .ok()
        .and_then(|value| value.parse::<u32>().ok());
    tick_interval_for(hz)
}

// Zero or missing rates fall back to the default.
fn tick_interval_for(hz: Option<u32>) -> Duration {
    let hz = hz.filter(|hz| *hz > 0).unwrap_or(DEFAULT_TICK_RATE_HZ);
    Duration::from_secs_f64(1.0 / f64::from(hz))
}

/// Gameplay tuning from `STAGE_TUNING_PATH`, or the built-in defaults.
pub fn stage_settings() -> io::Result<StageSettings> {
    match env::var("STAGE_TUNING_PATH") {
        Ok(path) => load_stage_settings(Path::new(&path)),
        Err(_) => Ok(StageSettings::default()),
    }
}

pub fn load_stage_settings(path: &Path) -> io::Result<StageSettings> {
    let text = fs::read_to_string(path)?;
    let settings: StageSettings = toml::from_str(&text).map_err(|e| {
        io::Error::other(format!(
            "failed to parse tuning file {}: {e}",
            path.display()
        ))
    })?;

    if settings.player.initial_lives > MAX_LIVES {
        return Err(io::Error::other(format!(
            "tuning file {}: initial_lives {} exceeds {MAX_LIVES}",
            path.display(),
            settings.player.initial_lives
        )));
    }
    Ok(settings)
}

pub const INPUT_CHANNEL_CAPACITY: usize = 1024;
pub const WORLD_BROADCAST_CAPACITY: usize = 128;

pub const DEFAULT_TICK_RATE_HZ: u32 = 60;
// Stage joined by clients that connect without a stage id.
pub const DEFAULT_STAGE_ID: &str = "default";
