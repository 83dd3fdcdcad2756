//! mouthpiece-server – Bibliotheks-Root
//!
//! Deklariert die Server-Module und stellt den oeffentlichen
//! Einstiegspunkt fuer Integrationstests bereit.

pub mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use mouthpiece_gateway::{
    AbschaltKoordinator, GatewayKontext, GatewayServer, RateLimiter, Verbindungsregister,
};
use mouthpiece_synthese::SyntheseEngine;
use tokio::sync::watch;

use config::ServerConfig;

/// Haelt den laufenden Server-Zustand zusammen
pub struct Server {
    pub config: ServerConfig,
    engine: Arc<dyn SyntheseEngine>,
}

impl Server {
    /// Erstellt einen neuen Server aus Konfiguration und Synthese-Engine
    pub fn neu(config: ServerConfig, engine: Arc<dyn SyntheseEngine>) -> Self {
        Self { config, engine }
    }

    /// Startet das Gateway und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Register, Rate-Limiter und Stimmen-Katalog aufbauen
    /// 2. Endpunkt binden und Accept-Schleife starten
    /// 3. Auf SIGINT/SIGTERM warten
    /// 4. Sitzungen schliessen, begrenzt auf Drain und Listener warten
    pub async fn starten(self) -> Result<()> {
        let grenzen = &self.config.grenzen;
        let register = Verbindungsregister::neu(grenzen.max_verbindungen);
        let limiter = Arc::new(RateLimiter::neu(
            Duration::from_secs(grenzen.rate_fenster_sekunden),
            grenzen.rate_max_anfragen,
        ));
        let katalog = Arc::new(self.config.stimmen.katalog());

        let kontext = GatewayKontext {
            register: register.clone(),
            limiter,
            engine: Arc::clone(&self.engine),
            katalog,
            max_text_laenge: grenzen.max_text_laenge,
        };

        let adresse = self.config.bind_adresse();
        let gateway = GatewayServer::binden(&adresse, kontext)
            .await
            .with_context(|| format!("Endpunkt {adresse} nicht bindbar"))?;

        tracing::info!(
            adresse = %adresse,
            max_verbindungen = grenzen.max_verbindungen,
            max_text_laenge = grenzen.max_text_laenge,
            standard_stimme = %self.config.stimmen.standard,
            "Gateway bereit"
        );

        let (stopp_tx, stopp_rx) = watch::channel(false);
        let listener_task = tokio::spawn(gateway.starten(stopp_rx));

        let koordinator = AbschaltKoordinator::neu(
            register,
            Duration::from_secs(grenzen.drain_frist_sekunden),
        );
        koordinator.ausfuehren(&stopp_tx, listener_task).await?;

        tracing::info!("Server beendet");
        Ok(())
    }
}
