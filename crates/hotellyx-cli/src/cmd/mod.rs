pub mod analytics;
pub mod completions;
pub mod dashboard;
pub mod init;
pub mod request;
pub mod room;
pub mod service;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use hotellyx_core::catalog::ServiceCatalog;
use hotellyx_core::clock::SystemClock;
use hotellyx_core::config::{self, HotelConfig};
use hotellyx_core::error::{ErrorCode, StoreError};
use hotellyx_core::lifecycle::RequestEngine;
use hotellyx_core::model::parse_iso;
use hotellyx_core::rooms::RoomEngine;
use hotellyx_core::store::SqliteStore;
use hotellyx_core::token;
use tracing::debug;

use crate::output::{CliError, OutputMode, render_error};

/// Open config and store for one command invocation.
pub struct Session {
    pub config: HotelConfig,
    pub store: SqliteStore,
    pub clock: SystemClock,
}

impl Session {
    /// Resolve config for `project_root` and open the store.
    ///
    /// `store_flag` wins over `HOTELLYX_STORE` and `[store] path`.
    ///
    /// # Errors
    ///
    /// Renders and returns an error when the config is invalid or the store
    /// cannot be opened.
    pub fn open(
        project_root: &Path,
        store_flag: Option<&Path>,
        output: OutputMode,
    ) -> anyhow::Result<Self> {
        let loaded = match config::load_config(project_root) {
            Ok(loaded) => loaded,
            Err(err) => {
                return fail(
                    output,
                    CliError::coded(ErrorCode::ConfigParseError, format!("{err:#}")),
                );
            }
        };
        let mut config = match config::apply_overrides(
            loaded,
            std::env::var("HOTELLYX_SLA_MINUTES").ok(),
            std::env::var("HOTELLYX_STORE").ok(),
        ) {
            Ok(config) => config,
            Err(err) => {
                return fail(
                    output,
                    CliError::coded(ErrorCode::InvalidConfigOverride, format!("{err:#}")),
                );
            }
        };
        if let Some(path) = store_flag {
            config.store.path = Some(PathBuf::from(path));
        }

        let path = config.store_path(project_root);
        debug!(path = %path.display(), "opening store");
        let store = persist(output, SqliteStore::open(&path))?;

        Ok(Self {
            config,
            store,
            clock: SystemClock,
        })
    }

    pub fn requests(&self) -> RequestEngine<'_, SqliteStore> {
        RequestEngine::new(&self.store, &self.clock)
    }

    pub fn rooms(&self) -> RoomEngine<'_, SqliteStore> {
        RoomEngine::new(&self.store, &self.clock).with_token_length(self.config.rooms.token_length)
    }

    pub fn catalog(&self) -> ServiceCatalog<'_, SqliteStore> {
        ServiceCatalog::new(&self.store, &self.clock)
    }
}

/// Render `error` and return it as a failure.
pub fn fail<T>(output: OutputMode, error: CliError) -> anyhow::Result<T> {
    render_error(output, &error)?;
    anyhow::bail!("{}", error.message)
}

/// Unwrap a store result, rendering the failure with its error code.
pub fn persist<T>(output: OutputMode, result: Result<T, StoreError>) -> anyhow::Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(err) => fail(output, CliError::from(&err)),
    }
}

/// Reject room links that can never match a room.
pub fn check_room_link(output: OutputMode, raw: &str) -> anyhow::Result<()> {
    if token::is_valid(raw) {
        Ok(())
    } else {
        fail(
            output,
            CliError::coded(
                ErrorCode::InvalidRoomToken,
                format!("invalid room link '{}'", raw.trim()),
            ),
        )
    }
}

/// Clap value parser for RFC 3339 timestamps.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_iso(raw).ok_or_else(|| format!("'{raw}' is not an RFC 3339 timestamp"))
}

/// Local wall-clock rendering for pretty output.
pub fn local_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// `local_time` for optional stamps, `-` when absent.
pub fn local_time_or_dash(ts: Option<DateTime<Utc>>) -> String {
    ts.map_or_else(|| "-".to_string(), local_time)
}
