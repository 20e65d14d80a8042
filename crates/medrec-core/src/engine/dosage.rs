//! Age-band dose selection.
//!
//! Selection is binary: elderly when the patient is past the threshold and
//! the medicine has an elderly band, adult otherwise. Child bands are
//! catalogued but never picked automatically.

use crate::models::{AgeBand, DosageBand, MedicineRecord, PatientProfile, PersonalizedDosage};

const DEFAULT_FREQUENCY: &str = "as directed";

/// Picks the dosage band for a patient.
#[derive(Debug, Clone, Copy)]
pub struct DosagePersonalizer {
    elderly_age_threshold: u32,
}

impl DosagePersonalizer {
    pub fn new(elderly_age_threshold: u32) -> Self {
        Self {
            elderly_age_threshold,
        }
    }

    /// Dose text and frequency for a patient.
    pub fn personalize(&self, medicine: &MedicineRecord, patient: &PatientProfile) -> PersonalizedDosage {
        let band = if patient.age > self.elderly_age_threshold {
            medicine
                .dosage
                .band(AgeBand::Elderly)
                .unwrap_or(&medicine.dosage.adult)
        } else {
            &medicine.dosage.adult
        };
        from_band(band)
    }

    /// Adult dose text and frequency, for requests without a patient.
    pub fn standard(&self, medicine: &MedicineRecord) -> PersonalizedDosage {
        from_band(&medicine.dosage.adult)
    }
}

fn from_band(band: &DosageBand) -> PersonalizedDosage {
    PersonalizedDosage {
        dosage: band.dose.clone(),
        frequency: band
            .frequency
            .clone()
            .unwrap_or_else(|| derive_frequency(&band.dose)),
    }
}

/// Derive a frequency from dose text.
///
/// "... every X" yields "X"; otherwise "once daily"/"twice daily" if
/// present; otherwise "as directed". Only used for bands without a stored
/// frequency.
pub fn derive_frequency(dose: &str) -> String {
    if let Some(after) = dose.split("every").nth(1) {
        return after.trim().to_string();
    }
    if dose.contains("once daily") {
        return "once daily".into();
    }
    if dose.contains("twice daily") {
        return "twice daily".into();
    }
    DEFAULT_FREQUENCY.into()
}
