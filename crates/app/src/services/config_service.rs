//! Config service: user-owned synchronization and power-controller settings.

use stovepanel_domain::coordination::SyncConfig;
use stovepanel_domain::error::{PanelError, ValidationError};
use stovepanel_domain::pid::{self, PidConfig, PidGains, PidStep};

use crate::ports::{Clock, IdentityContext, StateStore};
use crate::records;

/// Application service for [`SyncConfig`] and [`PidConfig`].
pub struct ConfigService<S, C> {
    store: S,
    clock: C,
    integral_limit: f64,
}

impl<S, C> ConfigService<S, C>
where
    S: StateStore,
    C: Clock,
{
    /// Create a new service. `integral_limit` is used by [`Self::preview_pid`].
    pub fn new(store: S, clock: C, integral_limit: f64) -> Self {
        Self {
            store,
            clock,
            integral_limit,
        }
    }

    /// Current synchronization settings, defaults when never saved.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn sync_config(&self) -> Result<SyncConfig, PanelError> {
        records::load_or_default(&self.store, records::SYNC_CONFIG).await
    }

    /// Replace the synchronization settings.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Validation`] for invalid settings, or a storage error.
    #[tracing::instrument(skip(self, identity, config), fields(operator = %identity.operator(), rooms = config.rooms.len()))]
    pub async fn save_sync_config(
        &self,
        identity: &impl IdentityContext,
        mut config: SyncConfig,
    ) -> Result<SyncConfig, PanelError> {
        config.validate()?;
        config.updated_at = Some(self.clock.now());
        config.updated_by = Some(identity.operator().to_string());
        records::save(&self.store, records::SYNC_CONFIG, &config).await?;
        Ok(config)
    }

    /// Current power-controller settings, defaults when never saved.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub async fn pid_config(&self) -> Result<PidConfig, PanelError> {
        records::load_or_default(&self.store, records::PID_CONFIG).await
    }

    /// Replace the power-controller settings.
    ///
    /// Controller memory of the zone is left alone; a gain change simply
    /// applies from the next interval.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Validation`] for invalid settings, or a storage error.
    #[tracing::instrument(skip(self, identity, config), fields(operator = %identity.operator(), enabled = config.enabled))]
    pub async fn save_pid_config(
        &self,
        identity: &impl IdentityContext,
        mut config: PidConfig,
    ) -> Result<PidConfig, PanelError> {
        config.validate()?;
        config.updated_at = Some(self.clock.now());
        config.updated_by = Some(identity.operator().to_string());
        records::save(&self.store, records::PID_CONFIG, &config).await?;
        Ok(config)
    }

    /// Evaluate the controller from a cold start without touching stored state.
    ///
    /// Uses the stored gains unless `gains` is given.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Validation`] for invalid gains or non-finite
    /// temperatures, or a storage error.
    pub async fn preview_pid(
        &self,
        gains: Option<PidGains>,
        setpoint: f64,
        measured: f64,
        dt_minutes: f64,
    ) -> Result<PidStep, PanelError> {
        let gains = match gains {
            Some(gains) => gains,
            None => self.pid_config().await?.gains,
        };
        gains.validate()?;
        for (field, value) in [("setpoint", setpoint), ("measured", measured)] {
            if !value.is_finite() {
                return Err(ValidationError::NotFinite { field }.into());
            }
        }
        Ok(pid::preview(gains, setpoint, measured, dt_minutes, self.integral_limit))
    }
}
