//! End-to-end pipeline tests.
//!
//! Sample PDFs go through the local OCR service; scripted OCR covers the
//! polling paths that real documents cannot trigger on demand.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{RecordingSleeper, Script, ScriptedOcr, TestHarness, PARSED};

use respondr::categorizer::{DocumentType, Hazard, Role};
use respondr::db::MetadataStore;
use respondr::error::OcrError;
use respondr::fixtures::sample_documents;
use respondr::ocr::PollSettings;
use respondr::pipeline::{NoopProgress, PipelineContext, PipelineError};
use respondr::storage::{sha256_hex, ObjectStore};
use respondr::worker::Job;

const SCENARIO: &str = "This Standard Operating Procedure covers chemical spill response by the EHS team in Building A, Virginia. Contact: safety@acme.com. Version 2.1.";

struct SampleCase {
    file_name: &'static str,
    expected_type: DocumentType,
    expected_pages: u32,
    expected_text_contains: &'static [&'static str],
}

const SAMPLE_CASES: &[SampleCase] = &[
    SampleCase {
        file_name: "evacuation_plan.pdf",
        expected_type: DocumentType::EmergencyPlan,
        expected_pages: 2,
        expected_text_contains: &["Emergency Evacuation Plan", "Assembly point"],
    },
    SampleCase {
        file_name: "chemical_storage_sop.pdf",
        expected_type: DocumentType::Sop,
        expected_pages: 1,
        expected_text_contains: &["Standard Operating Procedure", "Room 301"],
    },
    SampleCase {
        file_name: "loading_dock_incident_report.pdf",
        expected_type: DocumentType::IncidentReport,
        expected_pages: 1,
        expected_text_contains: &["Loading Dock Injury"],
    },
    SampleCase {
        file_name: "visitor_access_policy.pdf",
        expected_type: DocumentType::Policy,
        expected_pages: 1,
        expected_text_contains: &["Visitor Access Policy"],
    },
    SampleCase {
        file_name: "fire_warden_training.pdf",
        expected_type: DocumentType::Training,
        expected_pages: 1,
        expected_text_contains: &["Fire Warden Training Course"],
    },
];

#[test]
fn test_all_samples() {
    let harness = TestHarness::new();
    let samples = sample_documents();

    for case in SAMPLE_CASES {
        let sample = samples
            .iter()
            .find(|s| s.file_name == case.file_name)
            .unwrap_or_else(|| panic!("no sample named {}", case.file_name));
        let source = harness.upload_sample("acme", sample);

        let record = harness
            .pipeline
            .process(source.clone())
            .unwrap_or_else(|e| panic!("{} failed: {}", case.file_name, e));

        assert_eq!(record.document_type, case.expected_type, "{}", case.file_name);
        assert_eq!(record.page_count, case.expected_pages, "{}", case.file_name);
        assert_eq!(record.organization_id, "acme");
        assert_eq!(record.mime_type, "application/pdf");
        assert_eq!(record.classification, "internal");

        let text = harness
            .stored_text(&record.text_key())
            .unwrap_or_else(|| panic!("no text object for {}", case.file_name));
        for needle in case.expected_text_contains {
            assert!(
                text.contains(needle),
                "{}: text missing {:?}\n{}",
                case.file_name,
                needle,
                text
            );
        }
        assert!(record.text_preview.len() <= 500);
        assert!(text.starts_with(&record.text_preview));
    }

    assert_eq!(harness.db.scan_all().unwrap().len(), SAMPLE_CASES.len());
}

#[test]
fn test_evacuation_plan_fields() {
    let harness = TestHarness::new();
    let sample = &sample_documents()[0];
    let source = harness.upload_sample("acme", sample);
    let bytes = harness.store.get(&source.container, &source.key).unwrap();

    let record = harness.pipeline.process(source).unwrap();

    assert_eq!(record.version.as_deref(), Some("2.1"));
    assert_eq!(record.effective_date.as_deref(), Some("01/15/2024"));
    assert_eq!(record.author.as_deref(), Some("Dana Whitfield"));
    assert_eq!(record.jurisdiction.as_deref(), Some("VA"));
    assert!(record.facility.as_deref().unwrap().contains("Building A"));
    assert!(record.roles_involved.contains(&Role::Security));
    assert!(record.hazard_types.contains(&Hazard::Fire));
    assert!(record.hazard_types.contains(&Hazard::Flood));
    assert!(record.pii_present);
    assert_eq!(record.file_size_bytes, bytes.len() as u64);
    assert_eq!(record.checksum, sha256_hex(&bytes));
    assert!(record.ocr_coverage_pct > 0.0 && record.ocr_coverage_pct <= 100.0);
}

#[test]
fn test_scenario_through_scripted_ocr() {
    let ocr = Arc::new(ScriptedOcr::new(Script::Succeed {
        in_progress_polls: 3,
        pages: vec![vec![SCENARIO.to_string()]],
    }));
    let sleeper = Arc::new(RecordingSleeper::default());
    let harness = TestHarness::with_ocr(ocr.clone(), sleeper.clone(), PollSettings::default());
    let source = harness.upload("acme/chemical-sop.pdf", b"%PDF-1.4 placeholder");

    let record = harness.pipeline.process(source.clone()).unwrap();

    assert_eq!(record.document_type, DocumentType::Sop);
    assert!(record.hazard_types.contains(&Hazard::Chemical));
    assert!(record.roles_involved.contains(&Role::Ehs));
    assert!(record.facility.as_deref().unwrap().contains("Building A"));
    assert_eq!(record.jurisdiction.as_deref(), Some("VA"));
    assert!(record.pii_present);
    assert_eq!(record.version.as_deref(), Some("2.1"));
    assert_eq!(record.page_count, 1);

    assert_eq!(ocr.submitted(), vec![source]);
    assert_eq!(ocr.status_polls(), 4);
    assert_eq!(
        *sleeper.sleeps.lock().unwrap(),
        vec![Duration::from_secs(5); 3]
    );
    assert_eq!(
        harness.stored_text(&format!("{}/chemical-sop.txt", record.document_id)),
        Some(SCENARIO.to_string())
    );
}

#[test]
fn test_multi_page_results_are_joined() {
    let ocr = Arc::new(ScriptedOcr::new(Script::Succeed {
        in_progress_polls: 0,
        pages: vec![
            vec!["Evacuation Plan".to_string(), "Page one".to_string()],
            vec!["Page two".to_string()],
            vec!["Page three".to_string()],
        ],
    }));
    let harness = TestHarness::with_ocr(
        ocr,
        Arc::new(RecordingSleeper::default()),
        PollSettings::default(),
    );
    let source = harness.upload("plan.pdf", b"%PDF");

    let record = harness.pipeline.process(source).unwrap();

    assert_eq!(record.page_count, 3);
    assert_eq!(record.organization_id, "default_org");
    assert_eq!(
        harness.stored_text(&record.text_key()).unwrap(),
        "Evacuation Plan\nPage one\nPage two\nPage three"
    );
}

#[test]
fn test_timeout_writes_nothing() {
    let ocr = Arc::new(ScriptedOcr::new(Script::NeverFinish));
    let sleeper = Arc::new(RecordingSleeper::default());
    let harness = TestHarness::with_ocr(ocr.clone(), sleeper.clone(), PollSettings::default());
    let source = harness.upload("acme/stuck.pdf", b"%PDF");

    let err = harness.pipeline.process(source).unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Ocr(OcrError::Timeout { attempts: 60, .. })
    ));
    assert_eq!(ocr.status_polls(), 60);
    assert_eq!(sleeper.count(), 59);
    assert!(harness.db.scan_all().unwrap().is_empty());
    assert!(harness.store.list(PARSED, None).unwrap().is_empty());
}

#[test]
fn test_job_failure_reported_in_result() {
    let ocr = Arc::new(ScriptedOcr::new(Script::Fail("unsupported document".to_string())));
    let harness = TestHarness::with_ocr(
        ocr,
        Arc::new(RecordingSleeper::default()),
        PollSettings::default(),
    );
    let source = harness.upload("acme/bad.pdf", b"%PDF");

    let (result, ctx) = harness
        .pipeline
        .run(PipelineContext::new(Job::new(source)), &NoopProgress);

    assert!(!result.success);
    assert!(result.error.unwrap().contains("unsupported document"));
    assert!(ctx.extracted.is_none());
    assert!(harness.db.scan_all().unwrap().is_empty());
}

#[test]
fn test_invalid_pdf_fails_local_ocr() {
    let harness = TestHarness::new();
    let source = harness.upload("acme/broken.pdf", b"this is not a pdf");

    let err = harness.pipeline.process(source).unwrap_err();

    assert!(matches!(err, PipelineError::Ocr(OcrError::JobFailed { .. })));
    assert!(harness.db.scan_all().unwrap().is_empty());
}

#[test]
fn test_reprocessing_creates_new_record() {
    let ocr = Arc::new(ScriptedOcr::lines(&["Emergency evacuation plan"]));
    let harness = TestHarness::with_ocr(
        ocr,
        Arc::new(RecordingSleeper::default()),
        PollSettings::default(),
    );
    let source = harness.upload("acme/plan.pdf", b"%PDF");

    let first = harness.pipeline.process(source.clone()).unwrap();
    let second = harness.pipeline.process(source).unwrap();

    assert_ne!(first.document_id, second.document_id);
    assert_eq!(first.checksum, second.checksum);
    assert_eq!(harness.db.scan_all().unwrap().len(), 2);
    assert_eq!(harness.store.list(PARSED, None).unwrap().len(), 2);
}
