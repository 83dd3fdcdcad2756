//! Verbindungsregister – Zulassungskontrolle und Sitzungs-Verzeichnis
//!
//! Haelt die Menge der aktuell aktiven Sitzungen und erzwingt die
//! maximale Verbindungsanzahl. Die Momentaufnahme fuer den Shutdown-
//! Broadcast ist ein konsistenter Schnappschuss: alle Mutationen laufen
//! unter demselben Mutex, daher gilt zu jedem Zeitpunkt
//! `anzahl() <= max_verbindungen`.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mouthpiece_core::SessionId;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};

// ---------------------------------------------------------------------------
// SessionGriff
// ---------------------------------------------------------------------------

/// Handle auf eine aktive Sitzung
///
/// Wird vom Register gehalten und bei der Momentaufnahme geklont. Ueber
/// den Griff fordert der Shutdown-Broadcast jede Sitzung einzeln zum
/// Schliessen auf – jede Sitzung hat ihren eigenen Signalkanal statt
/// eines gemeinsamen Weckrufs.
#[derive(Debug, Clone)]
pub struct SessionGriff {
    /// Eindeutige Sitzungs-ID
    pub id: SessionId,
    /// Client-Schluessel (abgeleitet aus der Peer-Adresse)
    pub client_schluessel: String,
    /// Zeitpunkt der Zulassung
    pub erstellt_am: DateTime<Utc>,
    schliess_tx: mpsc::Sender<()>,
}

impl SessionGriff {
    /// Erstellt einen neuen Griff samt Empfaenger fuer das Schliess-Signal
    pub fn neu(client_schluessel: impl Into<String>) -> (Self, mpsc::Receiver<()>) {
        let (schliess_tx, schliess_rx) = mpsc::channel(1);
        let griff = Self {
            id: SessionId::new(),
            client_schluessel: client_schluessel.into(),
            erstellt_am: Utc::now(),
            schliess_tx,
        };
        (griff, schliess_rx)
    }

    /// Fordert die Sitzung auf sich zu schliessen.
    ///
    /// Nicht blockierend; ein bereits anstehendes Signal oder eine schon
    /// beendete Sitzung machen die Anforderung zum No-op.
    pub fn schliessen_anfordern(&self) {
        let _ = self.schliess_tx.try_send(());
    }
}

// ---------------------------------------------------------------------------
// Verbindungsregister
// ---------------------------------------------------------------------------

/// Register aller aktiven Sitzungen
///
/// Thread-safe via Arc + Mutex. Clone des Registers teilt den inneren
/// Zustand.
#[derive(Clone)]
pub struct Verbindungsregister {
    inner: Arc<RegisterInner>,
}

struct RegisterInner {
    max_verbindungen: usize,
    sitzungen: Mutex<HashMap<SessionId, SessionGriff>>,
    /// Veroeffentlicht die aktuelle Anzahl, damit der Shutdown-
    /// Koordinator das Leerlaufen abwarten kann
    anzahl_tx: watch::Sender<usize>,
}

impl Verbindungsregister {
    /// Erstellt ein Register mit der gegebenen Kapazitaet
    pub fn neu(max_verbindungen: usize) -> Self {
        let (anzahl_tx, _) = watch::channel(0);
        Self {
            inner: Arc::new(RegisterInner {
                max_verbindungen,
                sitzungen: Mutex::new(HashMap::new()),
                anzahl_tx,
            }),
        }
    }

    /// Nimmt eine Sitzung auf.
    ///
    /// Gibt `false` zurueck wenn das Register voll ist – der Aufrufer
    /// muss die Verbindung dann ablehnen.
    pub fn anmelden(&self, griff: SessionGriff) -> bool {
        let mut sitzungen = self.inner.sitzungen.lock();
        if sitzungen.len() >= self.inner.max_verbindungen {
            return false;
        }
        sitzungen.insert(griff.id, griff);
        self.inner.anzahl_tx.send_replace(sitzungen.len());
        true
    }

    /// Entfernt eine Sitzung (idempotent)
    pub fn abmelden(&self, id: &SessionId) {
        let mut sitzungen = self.inner.sitzungen.lock();
        if sitzungen.remove(id).is_some() {
            self.inner.anzahl_tx.send_replace(sitzungen.len());
        }
    }

    /// Anzahl der aktiven Sitzungen
    pub fn anzahl(&self) -> usize {
        self.inner.sitzungen.lock().len()
    }

    /// Konfigurierte Kapazitaet
    pub fn max_verbindungen(&self) -> usize {
        self.inner.max_verbindungen
    }

    /// Konsistente Momentaufnahme aller Sitzungs-Griffe.
    ///
    /// Nur vom Shutdown-Broadcast verwendet; keine Ordnungsgarantie.
    pub fn momentaufnahme(&self) -> Vec<SessionGriff> {
        self.inner.sitzungen.lock().values().cloned().collect()
    }

    /// Beobachter fuer die Sitzungsanzahl
    pub fn anzahl_beobachten(&self) -> watch::Receiver<usize> {
        self.inner.anzahl_tx.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
