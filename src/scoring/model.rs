//! Fragment-score tables used by the synthetic-accessibility and natural-product
//! scorers, and a lazily loaded shared handle around them.
//!
//! Both tables are plain text, one entry per line, `#` starting a comment:
//!
//! ```text
//! # natural-product model: <fragment id> <score>
//! 2245384272 -0.0735
//!
//! # synthetic-accessibility model: <score> <fragment id>...
//! -0.0444 98513984 2041434490 4010432519
//! ```

use std::collections::HashMap;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use nom::{
    character::complete::{digit1, space0, space1},
    combinator::{all_consuming, map_res},
    error::{convert_error, VerboseError},
    multi::many1,
    number::complete::double,
    sequence::{delimited, pair, preceded, separated_pair},
    IResult,
};
use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::*;

use super::FragmentId;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("failed to read scoring model {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid scoring model {path} at line {line}:\n{details}")]
    Syntax {
        path: PathBuf,
        line: usize,
        details: String,
    },
}

type Res<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

fn fragment_id(input: &str) -> Res<FragmentId> {
    map_res(digit1, str::parse::<FragmentId>)(input)
}

fn np_entry(input: &str) -> Res<(FragmentId, f64)> {
    separated_pair(fragment_id, space1, double)(input)
}

fn sa_entry(input: &str) -> Res<(f64, Vec<FragmentId>)> {
    pair(double, many1(preceded(space1, fragment_id)))(input)
}

/// Run `entry` over every non-blank, non-comment line of `text`.
fn parse_lines<'a, T>(
    text: &'a str,
    path: &Path,
    mut entry: impl FnMut(&'a str) -> Res<'a, T>,
) -> Result<Vec<T>, ModelError> {
    let mut entries = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let content = raw.split('#').next().unwrap_or_default();
        if content.trim().is_empty() {
            continue;
        }
        match all_consuming(delimited(space0, &mut entry, space0))(content) {
            Ok((_, value)) => entries.push(value),
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                return Err(ModelError::Syntax {
                    path: path.to_path_buf(),
                    line: index + 1,
                    details: convert_error(content, e),
                })
            }
            Err(nom::Err::Incomplete(_)) => {
                return Err(ModelError::Syntax {
                    path: path.to_path_buf(),
                    line: index + 1,
                    details: "incomplete entry".to_string(),
                })
            }
        }
    }
    Ok(entries)
}

fn read_text(path: &Path) -> Result<String, ModelError> {
    std::fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// A fragment-score table that can be read from disk.
pub trait ScoringModel: Sized + Send + Sync + 'static {
    /// Parse the model from text; `path` only labels errors.
    fn parse(text: &str, path: &Path) -> Result<Self, ModelError>;

    fn load(path: &Path) -> Result<Self, ModelError> {
        Self::parse(&read_text(path)?, path)
    }
}

/// Natural-product likeness contributions per fragment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NpModel {
    scores: HashMap<FragmentId, f64>,
}

impl NpModel {
    pub fn new(scores: HashMap<FragmentId, f64>) -> Self {
        Self { scores }
    }

    pub fn score(&self, id: FragmentId) -> Option<f64> {
        self.scores.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl ScoringModel for NpModel {
    fn parse(text: &str, path: &Path) -> Result<Self, ModelError> {
        let scores = parse_lines(text, path, np_entry)?.into_iter().collect();
        Ok(Self { scores })
    }
}

/// Synthetic-accessibility contributions per fragment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaModel {
    scores: HashMap<FragmentId, f64>,
}

impl SaModel {
    pub fn new(scores: HashMap<FragmentId, f64>) -> Self {
        Self { scores }
    }

    pub fn score(&self, id: FragmentId) -> Option<f64> {
        self.scores.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl ScoringModel for SaModel {
    fn parse(text: &str, path: &Path) -> Result<Self, ModelError> {
        let mut scores = HashMap::new();
        for (score, ids) in parse_lines(text, path, sa_entry)? {
            for id in ids {
                scores.insert(id, score);
            }
        }
        Ok(Self { scores })
    }
}

type Loader<M> = Box<dyn Fn() -> Result<Arc<M>, ModelError> + Send + Sync>;

/// A model loaded at most once, on first use, then shared by every caller.
///
/// A failed load leaves the handle empty, so the next [`ModelHandle::get`]
/// tries again.
pub struct ModelHandle<M> {
    cell: OnceCell<Arc<M>>,
    loader: Loader<M>,
    source: String,
}

impl<M: ScoringModel> ModelHandle<M> {
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let source = path.display().to_string();
        Self {
            cell: OnceCell::new(),
            loader: Box::new(move || M::load(&path).map(Arc::new)),
            source,
        }
    }

    pub fn preloaded(model: M) -> Self {
        let shared = Arc::new(model);
        let cell = OnceCell::with_value(shared.clone());
        Self {
            cell,
            loader: Box::new(move || Ok(shared.clone())),
            source: "<memory>".to_string(),
        }
    }

    pub fn get(&self) -> Result<Arc<M>, ModelError> {
        self.cell
            .get_or_try_init(|| {
                info!("Loading scoring model from {}", self.source);
                (self.loader)()
            })
            .cloned()
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<M> Debug for ModelHandle<M> {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        f.debug_struct("ModelHandle")
            .field("source", &self.source)
            .field("loaded", &self.cell.get().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> PathBuf {
        PathBuf::from("test.model")
    }

    #[test]
    fn test_parse_np_model() {
        let text = "# id score\n12 1.5\n\n  34\t-0.25  # trailing comment\n";
        let model = NpModel::parse(text, &path()).expect("Failed to parse model");
        assert_eq!(model.len(), 2);
        assert_eq!(model.score(12), Some(1.5));
        assert_eq!(model.score(34), Some(-0.25));
        assert_eq!(model.score(56), None);
    }

    #[test]
    fn test_parse_sa_model() {
        let text = "-0.5 1 2 3\n2.0 4\n";
        let model = SaModel::parse(text, &path()).expect("Failed to parse model");
        assert_eq!(model.len(), 4);
        assert_eq!(model.score(2), Some(-0.5));
        assert_eq!(model.score(4), Some(2.0));
    }

    #[test]
    fn test_empty_model_is_valid() {
        let model = NpModel::parse("# nothing here\n", &path()).expect("Failed to parse model");
        assert!(model.is_empty());
    }

    #[test]
    fn test_syntax_error_reports_line() {
        let error = NpModel::parse("1 0.5\nnot a number\n", &path()).unwrap_err();
        match error {
            ModelError::Syntax { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error {other:?}"),
        }
        assert!(SaModel::parse("0.5\n", &path()).is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let handle = ModelHandle::<NpModel>::from_file("/nonexistent/np.model");
        assert!(matches!(handle.get(), Err(ModelError::Io { .. })));
        assert!(!handle.is_loaded());
    }

    #[test]
    fn test_handle_loads_once() {
        let dir = std::env::temp_dir().join(format!("np-model-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("Failed to create directory");
        let file = dir.join("np.model");
        std::fs::write(&file, "7 3.0\n").expect("Failed to write model");

        let handle = ModelHandle::<NpModel>::from_file(&file);
        let first = handle.get().expect("Failed to load model");
        std::fs::remove_file(&file).expect("Failed to remove model");
        let second = handle.get().expect("Loaded model was not cached");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.score(7), Some(3.0));
    }

    #[test]
    fn test_preloaded_handle() {
        let handle = ModelHandle::preloaded(SaModel::new(HashMap::from([(1, 0.5)])));
        assert!(handle.is_loaded());
        assert_eq!(handle.get().expect("Failed to get model").score(1), Some(0.5));
    }
}
