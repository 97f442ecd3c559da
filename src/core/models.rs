//! Platform and modality identifiers from upload job configs.
//!
//! Upload configs carry these either as bare abbreviations or as the full
//! schema objects (`{"name": ..., "abbreviation": ...}`); both forms are
//! accepted and reduced to the abbreviation.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum AbbreviationRepr {
    Plain(String),
    Model { abbreviation: String },
}

impl AbbreviationRepr {
    fn into_abbreviation(self) -> String {
        match self {
            AbbreviationRepr::Plain(s) => s,
            AbbreviationRepr::Model { abbreviation } => abbreviation,
        }
    }
}

macro_rules! abbreviated_identifier {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name(String);

        impl $name {
            pub fn new(abbreviation: impl Into<String>) -> Self {
                Self(abbreviation.into())
            }

            pub fn abbreviation(&self) -> &str {
                &self.0
            }

            pub fn is(&self, abbreviation: &str) -> bool {
                self.0.eq_ignore_ascii_case(abbreviation)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                AbbreviationRepr::deserialize(deserializer).map(|r| Self(r.into_abbreviation()))
            }
        }
    };
}

abbreviated_identifier!(Platform);
abbreviated_identifier!(Modality);

impl Platform {
    pub const SMARTSPIM: &'static str = "SmartSPIM";

    pub fn is_smartspim(&self) -> bool {
        self.is(Self::SMARTSPIM)
    }
}

impl Modality {
    pub const SPIM: &'static str = "SPIM";

    pub fn is_spim(&self) -> bool {
        self.is(Self::SPIM)
    }
}

/// One modality entry of an upload config. Other keys are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModalityConfig {
    pub modality: Modality,
    pub source: PathBuf,
}
