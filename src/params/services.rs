use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Sums this close to 1 are left as they are.
const NORMALIZED_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    GeneralConsultation,
    Vaccination,
    PrenatalControl,
}

impl ServiceType {
    pub const ALL: [ServiceType; 3] = [
        ServiceType::GeneralConsultation,
        ServiceType::Vaccination,
        ServiceType::PrenatalControl,
    ];
}

impl Display for ServiceType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::GeneralConsultation => "general_consultation",
            Self::Vaccination => "vaccination",
            Self::PrenatalControl => "prenatal_control",
        };
        write!(f, "{name}")
    }
}

/// Share of visits per service type. The shares always sum to 1.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "RawServiceMix")]
pub struct ServiceMix {
    general_consultation: f64,
    vaccination: f64,
    prenatal_control: f64,
}

#[derive(Deserialize)]
struct RawServiceMix {
    #[serde(default)]
    general_consultation: f64,
    #[serde(default)]
    vaccination: f64,
    #[serde(default)]
    prenatal_control: f64,
}

impl From<RawServiceMix> for ServiceMix {
    fn from(raw: RawServiceMix) -> Self {
        Self::new(raw.general_consultation, raw.vaccination, raw.prenatal_control)
    }
}

impl Default for ServiceMix {
    fn default() -> Self {
        Self {
            general_consultation: 0.70,
            vaccination: 0.20,
            prenatal_control: 0.10,
        }
    }
}

impl ServiceMix {
    /// Builds a mix from raw weights, renormalizing them to sum to 1.
    /// Negative or non-finite weights count as zero; an all-zero input
    /// falls back to an even split.
    pub fn new(general_consultation: f64, vaccination: f64, prenatal_control: f64) -> Self {
        let mut mix = Self {
            general_consultation: sanitize(general_consultation),
            vaccination: sanitize(vaccination),
            prenatal_control: sanitize(prenatal_control),
        };
        mix.normalize();
        mix
    }

    pub fn share(&self, service: ServiceType) -> f64 {
        match service {
            ServiceType::GeneralConsultation => self.general_consultation,
            ServiceType::Vaccination => self.vaccination,
            ServiceType::PrenatalControl => self.prenatal_control,
        }
    }

    pub fn shares(&self) -> [(ServiceType, f64); 3] {
        ServiceType::ALL.map(|service| (service, self.share(service)))
    }

    pub fn total(&self) -> f64 {
        self.general_consultation + self.vaccination + self.prenatal_control
    }

    /// Pins `service` to `value` (clamped to [0, 1]) and rescales the other
    /// two shares proportionally so the mix still sums to 1.
    pub fn set_share(&mut self, service: ServiceType, value: f64) {
        let pinned = sanitize(value).min(1.0);
        let remaining = 1.0 - pinned;
        let others: Vec<ServiceType> = ServiceType::ALL
            .into_iter()
            .filter(|s| *s != service)
            .collect();
        let others_total: f64 = others.iter().map(|s| self.share(*s)).sum();

        *self.slot(service) = pinned;
        for other in others {
            let current = self.share(other);
            let rescaled = if others_total > 0.0 {
                current / others_total * remaining
            } else {
                remaining / 2.0
            };
            *self.slot(other) = rescaled;
        }
    }

    fn slot(&mut self, service: ServiceType) -> &mut f64 {
        match service {
            ServiceType::GeneralConsultation => &mut self.general_consultation,
            ServiceType::Vaccination => &mut self.vaccination,
            ServiceType::PrenatalControl => &mut self.prenatal_control,
        }
    }

    fn normalize(&mut self) {
        let total = self.total();
        if (total - 1.0).abs() <= NORMALIZED_TOLERANCE {
            return;
        }
        if total > 0.0 {
            self.general_consultation /= total;
            self.vaccination /= total;
            self.prenatal_control /= total;
        } else {
            let even = 1.0 / 3.0;
            self.general_consultation = even;
            self.vaccination = even;
            self.prenatal_control = even;
        }
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}
