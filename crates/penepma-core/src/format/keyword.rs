//! Fixed-column keyword and comment lines of PENELOPE input files.

use super::serialization::format_real;
use crate::common::constants::MAX_LINE_LENGTH;
use crate::domain::{PenelopeError, PenelopeResult};
use std::fmt::{Display, Formatter};

const KEYWORD_WIDTH: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub enum KeywordValue {
    Int(i64),
    Real(f64),
    Text(String),
}

impl Display for KeywordValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(value) => write!(f, "{value}"),
            Self::Real(value) => f.write_str(&format_real(*value)),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for KeywordValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for KeywordValue {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u8> for KeywordValue {
    fn from(value: u8) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<usize> for KeywordValue {
    fn from(value: usize) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<u64> for KeywordValue {
    fn from(value: u64) -> Self {
        Self::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<f64> for KeywordValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<&str> for KeywordValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for KeywordValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keyword {
    name: &'static str,
    description: &'static str,
}

impl Keyword {
    pub const fn new(name: &'static str, description: &'static str) -> Self {
        Self { name, description }
    }

    pub const fn bare(name: &'static str) -> Self {
        Self::new(name, "")
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Renders `NAME   v1 v2 ...` padded so that `[description]` ends at
    /// column 80.
    pub fn line(&self, values: &[KeywordValue]) -> PenelopeResult<String> {
        let text = values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        let mut line = format!(
            "{:<width$} {}",
            self.name.to_uppercase(),
            text,
            width = KEYWORD_WIDTH
        );

        if !self.description.is_empty() {
            let padded = MAX_LINE_LENGTH.saturating_sub(self.description.len() + 2);
            if line.len() < padded {
                line.push_str(&" ".repeat(padded - line.len()));
            }
            line.push('[');
            line.push_str(self.description);
            line.push(']');
        }

        check_line_length(line)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Comment {
    text: &'static str,
}

impl Comment {
    pub const fn new(text: &'static str) -> Self {
        Self { text }
    }

    pub fn line(&self) -> PenelopeResult<String> {
        Self::text_line(self.text)
    }

    pub fn text_line(text: &str) -> PenelopeResult<String> {
        check_line_length(format!("{} {}", " ".repeat(KEYWORD_WIDTH), text))
    }

    /// Comment line for free text, cut with `...` at the column limit.
    pub fn truncated_text_line(text: &str) -> String {
        let line = format!("{} {}", " ".repeat(KEYWORD_WIDTH), text);
        if line.len() <= MAX_LINE_LENGTH {
            return line;
        }

        let budget = MAX_LINE_LENGTH - ELLIPSIS.len();
        let cut = line
            .char_indices()
            .map(|(position, _)| position)
            .take_while(|position| *position <= budget)
            .last()
            .unwrap_or(0);
        format!("{}{ELLIPSIS}", &line[..cut])
    }
}

const ELLIPSIS: &str = "...";

fn check_line_length(line: String) -> PenelopeResult<String> {
    if line.len() > MAX_LINE_LENGTH {
        return Err(PenelopeError::internal(
            "FORMAT.LINE_LENGTH",
            format!(
                "input line exceeds {MAX_LINE_LENGTH} columns ({}): {line}",
                line.len()
            ),
        ));
    }
    Ok(line)
}

pub const TITLE: Keyword = Keyword::bare("TITLE");
pub const END: Keyword = Keyword::bare("END");

pub const SKPAR: Keyword = Keyword::new("SKPAR", "Kind of primary particle");
pub const SENERG: Keyword = Keyword::new("SENERG", "Energy of the electron beam, in eV");
pub const SPOSIT: Keyword = Keyword::new("SPOSIT", "Coordinates of the electron source");
pub const SDIREC: Keyword = Keyword::new("SDIREC", "Direction angles of the beam axis, in deg");
pub const SAPERT: Keyword = Keyword::new("SAPERT", "Beam aperture, in deg");
pub const SDIAM: Keyword = Keyword::new("SDIAM", "Beam diameter, in cm");

pub const MFNAME: Keyword = Keyword::new("MFNAME", "Material file, up to 20 chars");
pub const MSIMPA: Keyword = Keyword::new("MSIMPA", "EABS(1:3),C1,C2,WCC,WCR");

pub const GEOMFN: Keyword = Keyword::new("GEOMFN", "Geometry definition file, 20 chars");
pub const DSMAX: Keyword = Keyword::new("DSMAX", "IB, maximum step length (cm) in body IB");

pub const IFORCE: Keyword = Keyword::new("IFORCE", "KB,KPAR,ICOL,FORCER,WLOW,WHIG");

pub const NBE: Keyword = Keyword::new("NBE", "E-interval and no. of energy bins");

pub const PDANGL: Keyword = Keyword::new("PDANGL", "Angular window, in deg, IPSF");
pub const PDENER: Keyword = Keyword::new("PDENER", "Energy window, no. of channels");

pub const GRIDX: Keyword = Keyword::new("GRIDX", "X coordinates of the box vertices");
pub const GRIDY: Keyword = Keyword::new("GRIDY", "Y coordinates of the box vertices");
pub const GRIDZ: Keyword = Keyword::new("GRIDZ", "Z coordinates of the box vertices");
pub const XRLINE: Keyword = Keyword::new("XRLINE", "X-ray line, IZ*1e6+S1*1e4+S2*1e2");

pub const RESUME: Keyword = Keyword::new("RESUME", "Resume from this dump file, 20 chars");
pub const DUMPTO: Keyword = Keyword::new("DUMPTO", "Generate this dump file, 20 chars");
pub const DUMPP: Keyword = Keyword::new("DUMPP", "Dumping period, in sec");

pub const REFLIN: Keyword = Keyword::new("REFLIN", "IZ*1e6+S1*1e4+S2*1e2,detector,tolerance");
pub const NSIMSH: Keyword = Keyword::new("NSIMSH", "Desired number of simulated showers");
pub const TIME: Keyword = Keyword::new("TIME", "Allotted simulation time, in sec");

pub const TRJSC: Keyword = Keyword::new("TRJSC", "Track secondary electrons?");
pub const NTRJM: Keyword = Keyword::new("NTRJM", "Number of trajectories in the shower");

pub const SKIP: Comment = Comment::new(".");
pub const ELECTRON_BEAM: Comment = Comment::new(">>>>>>>> Electron beam definition.");
pub const MATERIAL_DATA: Comment =
    Comment::new(">>>>>>>> Material data and simulation parameters.");
pub const GEOMETRY: Comment = Comment::new(">>>>>>>> Geometry of the sample.");
pub const INTERACTION_FORCING: Comment = Comment::new(">>>>>>>> Interaction forcing.");
pub const EMERGING_DISTRIBUTION: Comment =
    Comment::new(">>>>>>>> Emerging particles. Energy and angular distributions.");
pub const PHOTON_DETECTORS: Comment = Comment::new(">>>>>>>> Photon detectors.");
pub const SPATIAL_DISTRIBUTION: Comment =
    Comment::new(">>>>>>>> Spatial distribution of events in a box.");
pub const JOB_PROPERTIES: Comment = Comment::new(">>>>>>>> Job properties.");
