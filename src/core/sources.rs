//! Collaborator seams that feed the engine, plus file-backed implementations.
//!
//! The engine itself never performs I/O. Everything it needs is fetched through
//! these traits first, so a database, an HTTP client or a fixture file can sit
//! behind them interchangeably.
#![allow(clippy::result_large_err)]

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use crate::utils::FileUtils;
use docflow_types::{Document, DocumentId, DocumentTypeId, ExecutionRecord, WorkflowCatalog};
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Supplies the workflow definition of a document type.
pub trait CatalogSource {
    /// `Ok(None)` means no definition exists; the timeline degrades to history only.
    fn catalog(&self, document_type_id: DocumentTypeId) -> Result<Option<WorkflowCatalog>, AppError>;
}

/// Supplies the append-only execution history of a document.
pub trait HistorySource {
    fn history(&self, document_id: DocumentId) -> Result<Vec<ExecutionRecord>, AppError>;
}

/// Supplies the current snapshot of a document.
pub trait DocumentSource {
    fn document(&self, document_id: DocumentId) -> Result<Document, AppError>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Many(Vec<WorkflowCatalog>),
    One(WorkflowCatalog),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HistoryFile {
    Records(Vec<ExecutionRecord>),
    ByDocument(BTreeMap<String, Vec<ExecutionRecord>>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DocumentFile {
    Many(Vec<Document>),
    One(Document),
}

fn load<T: serde::de::DeserializeOwned>(
    path: &Path,
    category: ErrorCategory,
    code: &str,
) -> Result<T, AppError> {
    FileUtils.load_any(path).map_err(|err| {
        let mut error = AppError::with_source(
            category,
            format!("failed to load {}", path.display()),
            err.into(),
        )
        .with_code(code)
        .with_suggestion("check that the file exists and holds JSON or YAML in the documented shape");
        error.add_context("path", &path.display().to_string());
        error
    })
}

/// Catalogs read from one JSON or YAML file holding a catalog or a list of them.
#[derive(Debug, Clone)]
pub struct FileCatalogSource {
    path: PathBuf,
    catalogs: IndexMap<DocumentTypeId, WorkflowCatalog>,
}

impl FileCatalogSource {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        let file: CatalogFile = load(&path, ErrorCategory::CatalogError, "DOC-SRC-001")?;
        let list = match file {
            CatalogFile::Many(list) => list,
            CatalogFile::One(catalog) => vec![catalog],
        };

        let mut catalogs = IndexMap::with_capacity(list.len());
        for catalog in list {
            if catalogs.contains_key(&catalog.document_type_id) {
                tracing::warn!(
                    path = %path.display(),
                    document_type = catalog.document_type_id,
                    "catalog file repeats a document type; keeping the first"
                );
                continue;
            }
            catalogs.insert(catalog.document_type_id, catalog);
        }
        tracing::debug!(path = %path.display(), catalogs = catalogs.len(), "loaded catalog file");
        Ok(Self { path, catalogs })
    }

    /// Document types in file order.
    pub fn document_types(&self) -> impl Iterator<Item = DocumentTypeId> + '_ {
        self.catalogs.keys().copied()
    }

    /// The requested catalog, or the only one when no type is given.
    pub fn select(&self, document_type_id: Option<DocumentTypeId>) -> Result<&WorkflowCatalog, AppError> {
        let found = match document_type_id {
            Some(id) => self.catalogs.get(&id),
            None if self.catalogs.len() == 1 => self.catalogs.values().next(),
            None => {
                return Err(AppError::new(
                    ErrorCategory::ValidationError,
                    format!(
                        "{} holds {} catalogs; pass --document-type to pick one",
                        self.path.display(),
                        self.catalogs.len()
                    ),
                )
                .with_code("DOC-SRC-004"))
            }
        };
        found.ok_or_else(|| {
            AppError::new(
                ErrorCategory::CatalogError,
                format!(
                    "no catalog for document type {} in {}",
                    document_type_id.map(|id| id.to_string()).unwrap_or_default(),
                    self.path.display()
                ),
            )
            .with_code("DOC-SRC-005")
        })
    }
}

impl CatalogSource for FileCatalogSource {
    fn catalog(&self, document_type_id: DocumentTypeId) -> Result<Option<WorkflowCatalog>, AppError> {
        Ok(self.catalogs.get(&document_type_id).cloned())
    }
}

/// Supplies no catalog at all; every timeline is assembled from history only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCatalog;

impl CatalogSource for NoCatalog {
    fn catalog(&self, _document_type_id: DocumentTypeId) -> Result<Option<WorkflowCatalog>, AppError> {
        Ok(None)
    }
}

/// History read from a file holding either a bare list of records, which is
/// served for any document, or an object keyed by document id.
#[derive(Debug, Clone)]
pub struct FileHistorySource {
    contents: HistoryContents,
}

#[derive(Debug, Clone)]
enum HistoryContents {
    Shared(Vec<ExecutionRecord>),
    ByDocument(BTreeMap<DocumentId, Vec<ExecutionRecord>>),
}

impl FileHistorySource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let file: HistoryFile = load(path, ErrorCategory::HistoryError, "DOC-SRC-002")?;
        let contents = match file {
            HistoryFile::Records(records) => HistoryContents::Shared(records),
            HistoryFile::ByDocument(map) => {
                let mut by_document = BTreeMap::new();
                for (key, records) in map {
                    let id: DocumentId = key.trim().parse().map_err(|_| {
                        AppError::new(
                            ErrorCategory::HistoryError,
                            format!("history key '{}' in {} is not a document id", key, path.display()),
                        )
                        .with_code("DOC-SRC-007")
                    })?;
                    by_document.insert(id, records);
                }
                HistoryContents::ByDocument(by_document)
            }
        };
        Ok(Self { contents })
    }
}

impl HistorySource for FileHistorySource {
    fn history(&self, document_id: DocumentId) -> Result<Vec<ExecutionRecord>, AppError> {
        Ok(match &self.contents {
            HistoryContents::Shared(records) => records.clone(),
            HistoryContents::ByDocument(map) => map.get(&document_id).cloned().unwrap_or_default(),
        })
    }
}

/// Document snapshots read from a file holding one document or a list.
#[derive(Debug, Clone)]
pub struct FileDocumentSource {
    path: PathBuf,
    documents: IndexMap<DocumentId, Document>,
}

impl FileDocumentSource {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        let file: DocumentFile = load(&path, ErrorCategory::DocumentError, "DOC-SRC-003")?;
        let list = match file {
            DocumentFile::Many(list) => list,
            DocumentFile::One(document) => vec![document],
        };
        let documents = list.into_iter().map(|doc| (doc.id, doc)).collect();
        Ok(Self { path, documents })
    }

    /// The document id when the file holds exactly one document.
    pub fn only_document_id(&self) -> Option<DocumentId> {
        match self.documents.len() {
            1 => self.documents.keys().next().copied(),
            _ => None,
        }
    }
}

impl DocumentSource for FileDocumentSource {
    fn document(&self, document_id: DocumentId) -> Result<Document, AppError> {
        self.documents.get(&document_id).cloned().ok_or_else(|| {
            AppError::new(
                ErrorCategory::DocumentError,
                format!("document {} not found in {}", document_id, self.path.display()),
            )
            .with_code("DOC-SRC-006")
        })
    }
}
