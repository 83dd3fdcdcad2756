//! Rate Limiter fuer das Mouthpiece-Gateway
//!
//! Sliding-Log pro Client-Schluessel: nur Anfragen innerhalb des
//! Zeitfensters zaehlen gegen das Limit. Exaktheit vor Speichereffizienz
//! – vertretbar, weil jeder Eintrag durch das Limit selbst beschraenkt
//! ist und die Fenster kurz sind. Eintraege werden lazy beim Pruefen
//! beschnitten, nie proaktiv.

use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Sliding-Window-Rate-Limiter pro Client-Schluessel
///
/// Lesen-Pruefen-Schreiben pro Schluessel laeuft atomar unter dem
/// jeweiligen Eintrags-Guard; verschiedene Schluessel blockieren sich
/// nicht gegenseitig.
pub struct RateLimiter {
    fenster: Duration,
    max_anfragen: usize,
    eintraege: DashMap<String, Vec<Instant>>,
}

impl RateLimiter {
    /// Erstellt einen Limiter mit Fensterdauer und Anfragen-Maximum
    pub fn neu(fenster: Duration, max_anfragen: usize) -> Self {
        Self {
            fenster,
            max_anfragen,
            eintraege: DashMap::new(),
        }
    }

    /// Prueft und verbucht eine Anfrage fuer einen Client-Schluessel.
    ///
    /// Zeitstempel aelter als das Fenster werden verworfen; liegt die
    /// verbleibende Anzahl beim Maximum wird abgelehnt (der beschnittene
    /// Eintrag bleibt gespeichert), sonst wird `jetzt` angehaengt und
    /// zugelassen. `jetzt` wird injiziert damit Tests nicht schlafen
    /// muessen.
    pub fn erlauben(&self, schluessel: &str, jetzt: Instant) -> bool {
        let mut eintrag = self.eintraege.entry(schluessel.to_string()).or_default();
        eintrag.retain(|zeitpunkt| jetzt.duration_since(*zeitpunkt) < self.fenster);
        if eintrag.len() >= self.max_anfragen {
            return false;
        }
        eintrag.push(jetzt);
        true
    }

    /// Entfernt den Eintrag eines Client-Schluessels vollstaendig.
    ///
    /// Wird beim Sitzungsabbau aufgerufen. Teilen sich mehrere Sitzungen
    /// einen Schluessel (etwa hinter einem gemeinsamen Egress), setzt
    /// das Abmelden einer Sitzung auch das Budget der uebrigen zurueck.
    pub fn vergessen(&self, schluessel: &str) {
        self.eintraege.remove(schluessel);
    }

    /// Prueft ob fuer einen Schluessel ein Eintrag existiert
    pub fn kennt(&self, schluessel: &str) -> bool {
        self.eintraege.contains_key(schluessel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max: usize) -> RateLimiter {
        RateLimiter::neu(Duration::from_secs(60), max)
    }

    #[test]
    fn erlaubt_anfragen_bis_zum_limit() {
        let limiter = limiter(20);
        let jetzt = Instant::now();
        for _ in 0..20 {
            assert!(limiter.erlauben("client", jetzt), "Anfrage sollte erlaubt sein");
        }
        assert!(
            !limiter.erlauben("client", jetzt),
            "21. Anfrage im Fenster sollte abgelehnt werden"
        );
    }

    #[test]
    fn nach_fensterablauf_wieder_erlaubt() {
        let limiter = limiter(3);
        let start = Instant::now();
        for _ in 0..3 {
            assert!(limiter.erlauben("client", start));
        }
        assert!(!limiter.erlauben("client", start));

        // Fenster abgelaufen: alte Zeitstempel werden verworfen
        let spaeter = start + Duration::from_secs(61);
        assert!(limiter.erlauben("client", spaeter));
    }

    #[test]
    fn verschiedene_schluessel_unabhaengig() {
        let limiter = limiter(1);
        let jetzt = Instant::now();
        assert!(limiter.erlauben("192.168.1.1:5000", jetzt));
        assert!(limiter.erlauben("192.168.1.2:5000", jetzt));
        assert!(!limiter.erlauben("192.168.1.1:5000", jetzt));
    }

    #[test]
    fn ablehnung_speichert_beschnittenen_eintrag() {
        let limiter = limiter(2);
        let start = Instant::now();
        assert!(limiter.erlauben("client", start));
        assert!(limiter.erlauben("client", start + Duration::from_secs(30)));

        // Erster Zeitstempel faellt aus dem Fenster, der zweite haelt
        // das Limit: abgelehnt, aber beschnitten gespeichert
        let spaeter = start + Duration::from_secs(70);
        assert!(limiter.erlauben("client", spaeter));
        assert!(!limiter.erlauben("client", spaeter));
    }

    #[test]
    fn vergessen_entfernt_eintrag() {
        let limiter = limiter(1);
        let jetzt = Instant::now();
        assert!(limiter.erlauben("client", jetzt));
        assert!(limiter.kennt("client"));

        limiter.vergessen("client");
        assert!(!limiter.kennt("client"));
        // Budget ist zurueckgesetzt
        assert!(limiter.erlauben("client", jetzt));
    }
}
