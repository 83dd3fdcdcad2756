//! Abschalt-Koordinator – geordnetes Herunterfahren
//!
//! Wartet auf ein Terminierungssignal, fordert dann jede registrierte
//! Sitzung einzeln zum Schliessen auf und wartet begrenzt auf das
//! Leerlaufen des Registers. Kein Nachfassen, keine Eskalation: nach
//! Ablauf der Frist faehrt der Server trotzdem herunter (Best-Effort-
//! Drain). Eine traege Synthese darf die Frist ueberleben.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::registry::Verbindungsregister;

/// Koordiniert das Herunterfahren des Gateways
pub struct AbschaltKoordinator {
    register: Verbindungsregister,
    drain_frist: Duration,
}

impl AbschaltKoordinator {
    /// Erstellt einen Koordinator mit der gegebenen Drain-Frist
    pub fn neu(register: Verbindungsregister, drain_frist: Duration) -> Self {
        Self {
            register,
            drain_frist,
        }
    }

    /// Blockiert bis SIGINT oder SIGTERM eintrifft.
    ///
    /// Beide Signale loesen denselben Shutdown aus.
    #[cfg(unix)]
    pub async fn auf_signal_warten() -> std::io::Result<()> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            ergebnis = tokio::signal::ctrl_c() => ergebnis?,
            _ = sigterm.recv() => {}
        }
        Ok(())
    }

    #[cfg(not(unix))]
    pub async fn auf_signal_warten() -> std::io::Result<()> {
        tokio::signal::ctrl_c().await
    }

    /// Fordert alle registrierten Sitzungen zum Schliessen auf und
    /// wartet begrenzt auf das Leerlaufen des Registers.
    pub async fn sitzungen_schliessen(&self) {
        let offene = self.register.momentaufnahme();
        if offene.is_empty() {
            return;
        }

        tracing::info!(anzahl = offene.len(), "Schliesse aktive Sitzungen");
        for griff in &offene {
            griff.schliessen_anfordern();
        }

        let mut anzahl_rx = self.register.anzahl_beobachten();
        let ergebnis = timeout(self.drain_frist, anzahl_rx.wait_for(|anzahl| *anzahl == 0)).await;
        match ergebnis {
            Ok(_) => tracing::info!("Alle Sitzungen geschlossen"),
            Err(_) => tracing::warn!(
                verbleibend = self.register.anzahl(),
                "Drain-Frist abgelaufen, fahre trotzdem fort"
            ),
        }
    }

    /// Voller Ablauf: Signal abwarten, Accept-Schleife stoppen,
    /// Sitzungen schliessen, Listener-Task begrenzt abwarten.
    pub async fn ausfuehren(
        &self,
        stopp_tx: &watch::Sender<bool>,
        listener_task: JoinHandle<std::io::Result<()>>,
    ) -> std::io::Result<()> {
        Self::auf_signal_warten().await?;
        tracing::info!("Shutdown-Signal empfangen");

        // Sofort keine neuen Verbindungen mehr annehmen
        let _ = stopp_tx.send(true);

        self.sitzungen_schliessen().await;

        // Begrenzt warten bis der Listener seine Ressourcen freigibt
        match timeout(self.drain_frist, listener_task).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => tracing::warn!(fehler = %e, "Listener endete mit Fehler"),
            Ok(Err(e)) => tracing::warn!(fehler = %e, "Listener-Task abgebrochen"),
            Err(_) => tracing::warn!("Frist fuer den Listener-Stopp abgelaufen"),
        }
        Ok(())
    }
}
