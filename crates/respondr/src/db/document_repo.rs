//! Document repository — operations on the `documents` table.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use super::{Database, DatabaseError};
use crate::categorizer::{DocumentType, Hazard, Role};
use crate::metadata::{DocumentRecord, SourceLocation};

/// Page size used when scanning the whole table.
pub const SCAN_PAGE_SIZE: u32 = 100;

const COLUMNS: &str = "doc_id, source_container, source_key, processed_at, org_id, version,
    effective_date, author, page_count, file_size_bytes, mime_type, checksum, ocr_coverage_pct,
    doctype, roles_involved, hazard_types, facility, jurisdiction, classification, pii_present,
    text_preview";

/// A raw document row.
#[derive(Debug, Clone)]
struct DocumentRow {
    doc_id: String,
    source_container: String,
    source_key: String,
    processed_at: String,
    org_id: String,
    version: Option<String>,
    effective_date: Option<String>,
    author: Option<String>,
    page_count: i64,
    file_size_bytes: i64,
    mime_type: String,
    checksum: String,
    ocr_coverage_pct: f64,
    doctype: String,
    roles_involved: String,
    hazard_types: String,
    facility: Option<String>,
    jurisdiction: Option<String>,
    classification: String,
    pii_present: bool,
    text_preview: String,
}

impl DocumentRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            doc_id: row.get("doc_id")?,
            source_container: row.get("source_container")?,
            source_key: row.get("source_key")?,
            processed_at: row.get("processed_at")?,
            org_id: row.get("org_id")?,
            version: row.get("version")?,
            effective_date: row.get("effective_date")?,
            author: row.get("author")?,
            page_count: row.get("page_count")?,
            file_size_bytes: row.get("file_size_bytes")?,
            mime_type: row.get("mime_type")?,
            checksum: row.get("checksum")?,
            ocr_coverage_pct: row.get("ocr_coverage_pct")?,
            doctype: row.get("doctype")?,
            roles_involved: row.get("roles_involved")?,
            hazard_types: row.get("hazard_types")?,
            facility: row.get("facility")?,
            jurisdiction: row.get("jurisdiction")?,
            classification: row.get("classification")?,
            pii_present: row.get("pii_present")?,
            text_preview: row.get("text_preview")?,
        })
    }

    fn from_record(record: &DocumentRecord) -> Result<Self, DatabaseError> {
        let encode = |e: serde_json::Error| DatabaseError::Encode {
            doc_id: record.document_id.clone(),
            reason: e.to_string(),
        };

        Ok(Self {
            doc_id: record.document_id.clone(),
            source_container: record.source.container.clone(),
            source_key: record.source.key.clone(),
            processed_at: record.processed_at.to_rfc3339(),
            org_id: record.organization_id.clone(),
            version: record.version.clone(),
            effective_date: record.effective_date.clone(),
            author: record.author.clone(),
            page_count: i64::from(record.page_count),
            file_size_bytes: i64::try_from(record.file_size_bytes).map_err(|e| {
                DatabaseError::Encode {
                    doc_id: record.document_id.clone(),
                    reason: e.to_string(),
                }
            })?,
            mime_type: record.mime_type.clone(),
            checksum: record.checksum.clone(),
            ocr_coverage_pct: record.ocr_coverage_pct,
            doctype: record.document_type.to_string(),
            roles_involved: serde_json::to_string(&record.roles_involved).map_err(encode)?,
            hazard_types: serde_json::to_string(&record.hazard_types).map_err(encode)?,
            facility: record.facility.clone(),
            jurisdiction: record.jurisdiction.clone(),
            classification: record.classification.clone(),
            pii_present: record.pii_present,
            text_preview: record.text_preview.clone(),
        })
    }

    fn into_record(self) -> Result<DocumentRecord, DatabaseError> {
        let doc_id = self.doc_id;
        let decode = |reason: String| DatabaseError::Decode {
            doc_id: doc_id.clone(),
            reason,
        };

        let processed_at = DateTime::parse_from_rfc3339(&self.processed_at)
            .map_err(|e| decode(format!("processed_at: {e}")))?
            .with_timezone(&Utc);
        let document_type: DocumentType = self
            .doctype
            .parse()
            .map_err(|e| decode(format!("doctype: {e}")))?;
        let roles_involved: Vec<Role> = serde_json::from_str(&self.roles_involved)
            .map_err(|e| decode(format!("roles_involved: {e}")))?;
        let hazard_types: Vec<Hazard> = serde_json::from_str(&self.hazard_types)
            .map_err(|e| decode(format!("hazard_types: {e}")))?;
        let page_count =
            u32::try_from(self.page_count).map_err(|e| decode(format!("page_count: {e}")))?;
        let file_size_bytes = u64::try_from(self.file_size_bytes)
            .map_err(|e| decode(format!("file_size_bytes: {e}")))?;

        Ok(DocumentRecord {
            document_id: doc_id.clone(),
            source: SourceLocation::new(self.source_container, self.source_key),
            processed_at,
            organization_id: self.org_id,
            version: self.version,
            effective_date: self.effective_date,
            author: self.author,
            page_count,
            file_size_bytes,
            mime_type: self.mime_type,
            checksum: self.checksum,
            ocr_coverage_pct: self.ocr_coverage_pct,
            document_type,
            roles_involved,
            hazard_types,
            facility: self.facility,
            jurisdiction: self.jurisdiction,
            classification: self.classification,
            pii_present: self.pii_present,
            text_preview: self.text_preview,
        })
    }
}

/// One page of a paginated scan. `last_evaluated_key` is set when more rows
/// may follow and is passed back as `start_after`.
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    pub items: Vec<DocumentRecord>,
    pub last_evaluated_key: Option<String>,
}

fn query_records(
    conn: &Connection,
    sql: &str,
    params: &[&dyn rusqlite::ToSql],
) -> Result<Vec<DocumentRecord>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, DocumentRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(DocumentRow::into_record).collect()
}

/// Inserts a new document row. Document ids are unique; inserting an
/// existing id fails.
pub fn insert(db: &Database, record: &DocumentRecord) -> Result<(), DatabaseError> {
    let row = DocumentRow::from_record(record)?;
    db.with_conn(|conn| {
        conn.execute(
            &format!(
                "INSERT INTO documents ({COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                 ?17, ?18, ?19, ?20, ?21)"
            ),
            params![
                row.doc_id,
                row.source_container,
                row.source_key,
                row.processed_at,
                row.org_id,
                row.version,
                row.effective_date,
                row.author,
                row.page_count,
                row.file_size_bytes,
                row.mime_type,
                row.checksum,
                row.ocr_coverage_pct,
                row.doctype,
                row.roles_involved,
                row.hazard_types,
                row.facility,
                row.jurisdiction,
                row.classification,
                row.pii_present,
                row.text_preview,
            ],
        )?;
        Ok(())
    })?;
    log::info!("Stored document {} ({})", record.document_id, record.document_type);
    Ok(())
}

/// Finds a document by its id.
pub fn find_by_id(db: &Database, doc_id: &str) -> Result<Option<DocumentRecord>, DatabaseError> {
    db.with_conn(|conn| {
        let sql = format!("SELECT {COLUMNS} FROM documents WHERE doc_id = ?1");
        Ok(query_records(conn, &sql, &[&doc_id])?.into_iter().next())
    })
}

/// Returns up to `limit` documents ordered by id, starting after
/// `start_after`.
pub fn scan_page(
    db: &Database,
    start_after: Option<&str>,
    limit: u32,
) -> Result<ScanPage, DatabaseError> {
    let limit = limit.max(1);
    db.with_conn(|conn| {
        let items = match start_after {
            Some(key) => query_records(
                conn,
                &format!(
                    "SELECT {COLUMNS} FROM documents WHERE doc_id > ?1 ORDER BY doc_id LIMIT ?2"
                ),
                &[&key, &limit],
            )?,
            None => query_records(
                conn,
                &format!("SELECT {COLUMNS} FROM documents ORDER BY doc_id LIMIT ?1"),
                &[&limit],
            )?,
        };

        let last_evaluated_key = if items.len() == limit as usize {
            items.last().map(|r| r.document_id.clone())
        } else {
            None
        };

        Ok(ScanPage {
            items,
            last_evaluated_key,
        })
    })
}

/// Documents of one organization.
pub fn scan_by_org(db: &Database, org_id: &str) -> Result<Vec<DocumentRecord>, DatabaseError> {
    db.with_conn(|conn| {
        query_records(
            conn,
            &format!("SELECT {COLUMNS} FROM documents WHERE org_id = ?1 ORDER BY doc_id"),
            &[&org_id],
        )
    })
}

/// Documents of one organization and document type, served by the
/// `(org_id, doctype)` index.
pub fn query_by_org_doctype(
    db: &Database,
    org_id: &str,
    document_type: DocumentType,
) -> Result<Vec<DocumentRecord>, DatabaseError> {
    let doctype = document_type.to_string();
    db.with_conn(|conn| {
        query_records(
            conn,
            &format!(
                "SELECT {COLUMNS} FROM documents INDEXED BY idx_documents_org_doctype
                 WHERE org_id = ?1 AND doctype = ?2 ORDER BY doc_id"
            ),
            &[&org_id, &doctype],
        )
    })
}

/// Total number of stored documents.
pub fn count(db: &Database) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |r| r.get(0))?;
        Ok(count.max(0) as u64)
    })
}
