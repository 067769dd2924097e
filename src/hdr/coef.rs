use serde::{Deserialize, Serialize};

use crate::foundation::error::{G2dError, G2dResult};

/// HDR configurations the hardware can hold at once.
pub const MAX_HDR_SET: usize = 4;

/// Entries of the electro-optical transfer LUT.
pub const EOTF_LUT_VALUES: usize = 129;
/// Entries of the opto-electrical transfer LUT.
pub const OETF_LUT_VALUES: usize = 33;
/// Entries of the gamut mapping matrix.
pub const GM_LUT_VALUES: usize = 9;
/// Entries of the tone mapping LUT.
pub const TM_LUT_VALUES: usize = 33;

/// Transfer-function LUT with X (input) and Y (output) samples.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLut {
    /// Input samples.
    pub x: Vec<u32>,
    /// Output samples.
    pub y: Vec<u32>,
}

/// Tone mapping LUT plus its combined control values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToneMapping {
    /// Input samples.
    pub x: Vec<u32>,
    /// Output samples.
    pub y: Vec<u32>,
    /// Luminance weights, 10 bits each.
    pub coef: [u32; 3],
    /// Input range, 16 bits each.
    pub range_x: [u32; 2],
    /// Output range, 9 bits each.
    pub range_y: [u32; 2],
}

/// Coefficients of one HDR configuration. A stage is enabled when present.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HdrCoefficientSet {
    /// Opto-electrical transfer.
    #[serde(default)]
    pub oetf: Option<TransferLut>,
    /// Electro-optical transfer.
    #[serde(default)]
    pub eotf: Option<TransferLut>,
    /// Gamut mapping matrix.
    #[serde(default)]
    pub gamut: Option<Vec<u32>>,
    /// Tone mapping.
    #[serde(default)]
    pub tone: Option<ToneMapping>,
}

fn check_len(set: usize, what: &str, values: &[u32], expected: usize) -> G2dResult<()> {
    if values.len() == expected {
        Ok(())
    } else {
        Err(G2dError::config(format!(
            "HDR set {set}: {what} has {} coefficients, expected {expected}",
            values.len()
        )))
    }
}

impl HdrCoefficientSet {
    /// Return `true` when any stage is enabled.
    pub fn is_enabled(&self) -> bool {
        self.oetf.is_some() || self.eotf.is_some() || self.gamut.is_some() || self.tone.is_some()
    }

    fn validate(&self, set: usize) -> G2dResult<()> {
        if let Some(lut) = &self.oetf {
            check_len(set, "OETF x", &lut.x, OETF_LUT_VALUES)?;
            check_len(set, "OETF y", &lut.y, OETF_LUT_VALUES)?;
        }
        if let Some(lut) = &self.eotf {
            check_len(set, "EOTF x", &lut.x, EOTF_LUT_VALUES)?;
            check_len(set, "EOTF y", &lut.y, EOTF_LUT_VALUES)?;
        }
        if let Some(gm) = &self.gamut {
            check_len(set, "gamut", gm, GM_LUT_VALUES)?;
        }
        if let Some(tm) = &self.tone {
            check_len(set, "TM x", &tm.x, TM_LUT_VALUES)?;
            check_len(set, "TM y", &tm.y, TM_LUT_VALUES)?;
        }
        Ok(())
    }
}

/// Caller-managed HDR coefficient state.
///
/// Configured independently of frames and kept until replaced or cleared.
/// `layer_map[n]` has bit `i` set when task source `i` uses configuration `n`.
/// Deserialization goes through [`HdrLibrary::set_coefficients`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HdrLibrary {
    layer_map: [u32; MAX_HDR_SET],
    sets: [HdrCoefficientSet; MAX_HDR_SET],
}

#[derive(Deserialize)]
struct HdrLibraryConfig {
    #[serde(default)]
    layer_map: [u32; MAX_HDR_SET],
    #[serde(default)]
    sets: Vec<HdrCoefficientSet>,
}

impl<'de> Deserialize<'de> for HdrLibrary {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let config = HdrLibraryConfig::deserialize(deserializer)?;
        let mut library = Self::new();
        library
            .set_coefficients(config.layer_map, config.sets)
            .map_err(serde::de::Error::custom)?;
        Ok(library)
    }
}

impl HdrLibrary {
    /// Empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every configuration.
    ///
    /// Slots beyond `sets.len()` are disabled. On error the previous state is kept.
    pub fn set_coefficients(
        &mut self,
        layer_map: [u32; MAX_HDR_SET],
        sets: Vec<HdrCoefficientSet>,
    ) -> G2dResult<()> {
        if sets.len() > MAX_HDR_SET {
            return Err(G2dError::config(format!(
                "{} HDR sets exceed the maximum of {MAX_HDR_SET}",
                sets.len()
            )));
        }
        for (i, set) in sets.iter().enumerate() {
            set.validate(i)?;
        }

        let mut next: [HdrCoefficientSet; MAX_HDR_SET] = Default::default();
        for (slot, set) in next.iter_mut().zip(sets) {
            *slot = set;
        }
        self.layer_map = layer_map;
        self.sets = next;
        Ok(())
    }

    /// Drop every configuration.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Configurations by slot.
    pub fn sets(&self) -> &[HdrCoefficientSet; MAX_HDR_SET] {
        &self.sets
    }

    /// Layer bitmap per slot.
    pub fn layer_map(&self) -> &[u32; MAX_HDR_SET] {
        &self.layer_map
    }

    /// Return `true` when any slot is enabled.
    pub fn is_active(&self) -> bool {
        self.sets.iter().any(HdrCoefficientSet::is_enabled)
    }

    /// First configuration whose bitmap selects task source `index`.
    pub fn set_for_source(&self, index: usize) -> Option<usize> {
        let bit = 1u32.checked_shl(index as u32)?;
        self.layer_map.iter().position(|m| m & bit != 0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/hdr/coef.rs"]
mod tests;
