use async_trait::async_trait;
use doc_audit::models::ReportArtifact;
use doc_audit::{
    AppResult, DocumentSlot, FileFormat, RemoteTaskClient, ReportAction, ReportSink, TaskError,
    TaskId, TaskOrchestrator, TaskStatus, UploadedDocument,
};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio_test::{assert_err, assert_ok};

// ========== 脚本化客户端 ==========

struct Step {
    gate: Option<oneshot::Receiver<()>>,
    reply: Result<Value, String>,
}

/// 按 "任务:文档名" 预先编排响应的客户端
#[derive(Default)]
struct ScriptedClient {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: Mutex<Vec<String>>,
    reports: Mutex<HashMap<String, Result<String, String>>>,
}

impl ScriptedClient {
    fn push(&self, key: &str, step: Step) {
        self.scripts
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push_back(step);
    }

    fn reply(&self, key: &str, value: Value) {
        self.push(
            key,
            Step {
                gate: None,
                reply: Ok(value),
            },
        );
    }

    fn fail(&self, key: &str, message: &str) {
        self.push(
            key,
            Step {
                gate: None,
                reply: Err(message.to_string()),
            },
        );
    }

    /// 响应在返回的 sender 触发前不会到达
    fn gated(&self, key: &str, reply: Result<Value, String>) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.push(
            key,
            Step {
                gate: Some(rx),
                reply,
            },
        );
        tx
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn answer(&self, key: String) -> Result<Value, TaskError> {
        let step = {
            self.calls.lock().unwrap().push(key.clone());
            self.scripts
                .lock()
                .unwrap()
                .get_mut(&key)
                .and_then(VecDeque::pop_front)
        };
        let Some(step) = step else {
            return Err(TaskError::network(&key, "no scripted response"));
        };
        if let Some(gate) = step.gate {
            let _ = gate.await;
        }
        step.reply.map_err(|message| TaskError::network(&key, message))
    }
}

#[async_trait]
impl RemoteTaskClient for ScriptedClient {
    async fn run_single(
        &self,
        task: TaskId,
        _format: FileFormat,
        document: &UploadedDocument,
    ) -> Result<Value, TaskError> {
        self.answer(format!("{}:{}", task, document.name)).await
    }

    async fn run_group(
        &self,
        task: TaskId,
        _format: FileFormat,
        documents: &[(&'static str, UploadedDocument)],
    ) -> Result<Value, TaskError> {
        let names: Vec<String> = documents
            .iter()
            .map(|(field, doc)| format!("{}={}", field, doc.name))
            .collect();
        self.answer(format!("{}:{}", task, names.join("+"))).await
    }

    async fn generate_report(&self, document: &UploadedDocument) -> Result<String, TaskError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("report:{}", document.name));
        match self.reports.lock().unwrap().remove(&document.name) {
            Some(Ok(html)) => Ok(html),
            Some(Err(message)) => Err(TaskError::network("/report/generate/", message)),
            None => Err(TaskError::network("/report/generate/", "no scripted report")),
        }
    }
}

/// 记录交付的报告
#[derive(Default)]
struct RecordingSink {
    delivered: Mutex<Vec<ReportArtifact>>,
}

impl ReportSink for RecordingSink {
    fn deliver(&self, artifact: &ReportArtifact) -> AppResult<PathBuf> {
        self.delivered.lock().unwrap().push(artifact.clone());
        Ok(PathBuf::from(&artifact.file_name))
    }
}

// ========== 辅助函数 ==========

fn doc(name: &str) -> UploadedDocument {
    UploadedDocument::new(name, FileFormat::Pdf, name.as_bytes().to_vec())
}

fn setup(slots: &[DocumentSlot]) -> (Arc<ScriptedClient>, Arc<RecordingSink>, TaskOrchestrator) {
    let client = Arc::new(ScriptedClient::default());
    let sink = Arc::new(RecordingSink::default());
    let orchestrator = TaskOrchestrator::new(client.clone(), sink.clone(), FileFormat::Pdf);
    for slot in slots {
        orchestrator.set_slot(*slot, Some(doc(&format!("{}.pdf", slot))));
    }
    (client, sink, orchestrator)
}

fn status(orchestrator: &TaskOrchestrator, task: TaskId, slot: DocumentSlot) -> Option<TaskStatus> {
    orchestrator.get_results(task).get(&slot).map(|r| r.status)
}

// ========== 独立任务 ==========

#[tokio::test]
async fn test_title_validation_is_valid_passes() {
    let (client, _, orchestrator) = setup(&[]);
    orchestrator.set_slot(DocumentSlot::Ce1, Some(doc("doc.pdf")));
    client.reply("title-validation:doc.pdf", json!({"is_valid": true}));

    assert_ok!(orchestrator.run_task(TaskId::TitleValidation).await);

    let results = orchestrator.get_results(TaskId::TitleValidation);
    let ce1 = &results[&DocumentSlot::Ce1];
    assert_eq!(ce1.status, TaskStatus::Pass);
    assert!(ce1.success);
}

#[tokio::test]
async fn test_single_document_task_only_touches_populated_slot() {
    let (client, _, orchestrator) = setup(&[DocumentSlot::Ce1]);
    client.reply("grammar:ce1.pdf", json!({"status": "fail", "message": "2 typos"}));

    let outcome = orchestrator.run_task(TaskId::Grammar).await.unwrap();
    assert_eq!(outcome.report.calls, 1);
    assert_eq!(outcome.report.written, vec![DocumentSlot::Ce1]);

    let results = orchestrator.get_results(TaskId::Grammar);
    assert_eq!(results.len(), 1);
    assert_eq!(results[&DocumentSlot::Ce1].status, TaskStatus::Fail);
    assert_eq!(results[&DocumentSlot::Ce1].message.as_deref(), Some("2 typos"));
    for slot in [DocumentSlot::Ce2, DocumentSlot::Ce3, DocumentSlot::Rw] {
        assert_eq!(status(&orchestrator, TaskId::Grammar, slot), None);
    }
}

#[tokio::test]
async fn test_network_failure_on_one_slot_does_not_abort_siblings() {
    let (client, _, orchestrator) = setup(&[
        DocumentSlot::Ce1,
        DocumentSlot::Ce2,
        DocumentSlot::Ce3,
    ]);
    let release_ce1 = client.gated("code-validation:ce1.pdf", Ok(json!({"success": true})));
    client.fail("code-validation:ce2.pdf", "connection reset");
    client.reply("code-validation:ce3.pdf", json!({"status": "pass"}));

    let (outcome, _) = tokio::join!(orchestrator.run_task(TaskId::CodeValidation), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        // ce2 已失败，ce1 仍在等待
        assert_eq!(
            status(&orchestrator, TaskId::CodeValidation, DocumentSlot::Ce2),
            Some(TaskStatus::Fail)
        );
        assert_eq!(
            status(&orchestrator, TaskId::CodeValidation, DocumentSlot::Ce1),
            Some(TaskStatus::Loading)
        );
        release_ce1.send(()).unwrap();
    });

    assert_eq!(outcome.unwrap().report.written.len(), 3);
    let results = orchestrator.get_results(TaskId::CodeValidation);
    assert_eq!(results[&DocumentSlot::Ce1].status, TaskStatus::Pass);
    assert_eq!(results[&DocumentSlot::Ce3].status, TaskStatus::Pass);
    let ce2 = &results[&DocumentSlot::Ce2];
    assert_eq!(ce2.status, TaskStatus::Fail);
    assert!(!ce2.success);
    assert!(ce2.message.as_deref().unwrap().contains("connection reset"));
}

#[tokio::test]
async fn test_response_without_verdict_fields_fails() {
    let (client, _, orchestrator) = setup(&[DocumentSlot::Rw]);
    client.reply("figure-placement:rw.pdf", json!({"figures": []}));

    orchestrator.run_task(TaskId::FigurePlacement).await.unwrap();
    assert_eq!(
        status(&orchestrator, TaskId::FigurePlacement, DocumentSlot::Rw),
        Some(TaskStatus::Fail)
    );
}

// ========== 成对对比 ==========

#[tokio::test]
async fn test_pairwise_without_reference_is_precondition_error() {
    let (client, _, orchestrator) = setup(&[DocumentSlot::Ce1, DocumentSlot::Ce2]);

    for task in [TaskId::TitleComparison, TaskId::VisualComparison] {
        let err = assert_err!(orchestrator.run_task(task).await);
        assert!(err.is_precondition());
    }

    assert!(client.calls().is_empty());
    assert!(orchestrator.get_all_results().is_empty());
    assert!(orchestrator.in_flight().is_empty());
}

#[tokio::test]
async fn test_title_comparison_pairs_each_ce_with_reference() {
    let (client, _, orchestrator) = setup(&[
        DocumentSlot::Ce1,
        DocumentSlot::Ce2,
        DocumentSlot::Rw,
    ]);
    client.reply(
        "title-comparison:file_1=ce1.pdf+file_2=rw.pdf",
        json!({"match": true}),
    );
    client.reply(
        "title-comparison:file_1=ce2.pdf+file_2=rw.pdf",
        json!({"match": false}),
    );

    orchestrator.run_task(TaskId::TitleComparison).await.unwrap();

    let results = orchestrator.get_results(TaskId::TitleComparison);
    assert_eq!(results[&DocumentSlot::Ce1].status, TaskStatus::Pass);
    assert_eq!(results[&DocumentSlot::Ce2].status, TaskStatus::Fail);
    assert!(!results.contains_key(&DocumentSlot::Ce3));
    assert!(!results.contains_key(&DocumentSlot::Rw));
}

#[tokio::test]
async fn test_visual_comparison_needs_full_similarity() {
    let (client, _, orchestrator) = setup(&[
        DocumentSlot::Ce1,
        DocumentSlot::Ce3,
        DocumentSlot::Rw,
    ]);
    client.reply(
        "visual-comparison:file_1=ce1.pdf+file_2=rw.pdf",
        json!({"summary": {"similarity_score": 100}}),
    );
    client.reply(
        "visual-comparison:file_1=ce3.pdf+file_2=rw.pdf",
        json!({"similarity": 97.2}),
    );

    orchestrator.run_task(TaskId::VisualComparison).await.unwrap();

    assert_eq!(
        status(&orchestrator, TaskId::VisualComparison, DocumentSlot::Ce1),
        Some(TaskStatus::Pass)
    );
    assert_eq!(
        status(&orchestrator, TaskId::VisualComparison, DocumentSlot::Ce3),
        Some(TaskStatus::Fail)
    );
}

// ========== 格式一致性 ==========

#[tokio::test]
async fn test_format_comparison_shares_verdict_across_ce_slots() {
    let (client, _, orchestrator) = setup(&[
        DocumentSlot::Ce1,
        DocumentSlot::Ce2,
        DocumentSlot::Ce3,
    ]);
    client.reply(
        "format-comparison:file_1=ce1.pdf+file_2=ce2.pdf+file_3=ce3.pdf",
        json!({"consistency": {"all_match": true}, "message": "consistent"}),
    );

    let outcome = orchestrator.run_task(TaskId::FormatComparison).await.unwrap();
    assert_eq!(outcome.report.calls, 1);

    let results = orchestrator.get_results(TaskId::FormatComparison);
    assert_eq!(results.len(), 3);
    let first = &results[&DocumentSlot::Ce1];
    assert_eq!(first.status, TaskStatus::Pass);
    assert_eq!(&results[&DocumentSlot::Ce2], first);
    assert_eq!(&results[&DocumentSlot::Ce3], first);
    assert!(!results.contains_key(&DocumentSlot::Rw));
}

#[tokio::test]
async fn test_format_comparison_phases_are_independent() {
    let (client, _, orchestrator) = setup(&DocumentSlot::ALL);
    client.reply(
        "format-comparison:file_1=ce1.pdf+file_2=ce2.pdf+file_3=ce3.pdf",
        json!({"consistency": {"all_match": false}}),
    );
    client.reply(
        "format-comparison:file_1=ce1.pdf+file_2=ce2.pdf+file_3=rw.pdf",
        json!({"consistency": {"all_match": true}}),
    );

    let outcome = orchestrator.run_task(TaskId::FormatComparison).await.unwrap();
    assert_eq!(outcome.report.calls, 2);

    for slot in DocumentSlot::CE {
        assert_eq!(
            status(&orchestrator, TaskId::FormatComparison, slot),
            Some(TaskStatus::Fail)
        );
    }
    assert_eq!(
        status(&orchestrator, TaskId::FormatComparison, DocumentSlot::Rw),
        Some(TaskStatus::Pass)
    );
}

#[tokio::test]
async fn test_format_comparison_phase_failure_does_not_block_other_phase() {
    let (client, _, orchestrator) = setup(&DocumentSlot::ALL);
    client.fail(
        "format-comparison:file_1=ce1.pdf+file_2=ce2.pdf+file_3=ce3.pdf",
        "HTTP 502 Bad Gateway",
    );
    client.reply(
        "format-comparison:file_1=ce1.pdf+file_2=ce2.pdf+file_3=rw.pdf",
        json!({"consistency": {"all_match": true}}),
    );

    orchestrator.run_task(TaskId::FormatComparison).await.unwrap();

    let results = orchestrator.get_results(TaskId::FormatComparison);
    assert!(results[&DocumentSlot::Ce3]
        .message
        .as_deref()
        .unwrap()
        .contains("502"));
    assert_eq!(results[&DocumentSlot::Rw].status, TaskStatus::Pass);
}

// ========== 运行中标记与调用令牌 ==========

#[tokio::test]
async fn test_in_flight_cleared_after_all_calls_settle() {
    let (client, _, orchestrator) = setup(&[DocumentSlot::Ce1]);
    let release = client.gated("grammar:ce1.pdf", Ok(json!({"status": "pass"})));

    let (outcome, _) = tokio::join!(orchestrator.run_task(TaskId::Grammar), async {
        tokio::task::yield_now().await;
        assert!(orchestrator.is_running(TaskId::Grammar));
        assert_eq!(
            status(&orchestrator, TaskId::Grammar, DocumentSlot::Ce1),
            Some(TaskStatus::Loading)
        );
        release.send(()).unwrap();
    });

    assert_ok!(outcome);
    assert!(orchestrator.in_flight().is_empty());
}

#[tokio::test]
async fn test_overlapping_invocations_keep_latest_results() {
    let (client, _, orchestrator) = setup(&[DocumentSlot::Ce1]);
    let release_first = client.gated("grammar:ce1.pdf", Ok(json!({"status": "fail"})));
    client.reply("grammar:ce1.pdf", json!({"status": "pass"}));

    let (first, _) = tokio::join!(orchestrator.run_task(TaskId::Grammar), async {
        tokio::task::yield_now().await;
        let second = orchestrator.run_task(TaskId::Grammar).await.unwrap();
        assert_eq!(second.report.written, vec![DocumentSlot::Ce1]);

        // 第一次调用仍未结束
        assert!(orchestrator.is_running(TaskId::Grammar));
        assert_eq!(
            status(&orchestrator, TaskId::Grammar, DocumentSlot::Ce1),
            Some(TaskStatus::Pass)
        );
        release_first.send(()).unwrap();
    });

    let first = first.unwrap();
    assert_eq!(first.report.discarded, 1);
    assert!(first.report.written.is_empty());
    assert_eq!(
        status(&orchestrator, TaskId::Grammar, DocumentSlot::Ce1),
        Some(TaskStatus::Pass)
    );
    assert!(orchestrator.in_flight().is_empty());
}

#[tokio::test]
async fn test_slot_dropped_from_newer_invocation_still_settles() {
    let (client, _, orchestrator) = setup(&[DocumentSlot::Ce1, DocumentSlot::Ce2]);
    client.reply("grammar:ce1.pdf", json!({"status": "fail"}));
    let release_ce2 = client.gated("grammar:ce2.pdf", Ok(json!({"status": "pass"})));
    client.reply("grammar:ce1.pdf", json!({"status": "pass"}));

    let (first, _) = tokio::join!(orchestrator.run_task(TaskId::Grammar), async {
        tokio::task::yield_now().await;
        orchestrator.set_slot(DocumentSlot::Ce2, None);
        let second = orchestrator.run_task(TaskId::Grammar).await.unwrap();
        assert_eq!(second.report.written, vec![DocumentSlot::Ce1]);
        release_ce2.send(()).unwrap();
    });

    // 第二次调用没有认领 ce2，第一次调用的结果照常写入
    let first = first.unwrap();
    assert!(first.report.written.contains(&DocumentSlot::Ce2));
    assert_eq!(first.report.discarded, 0);
    assert_eq!(
        status(&orchestrator, TaskId::Grammar, DocumentSlot::Ce2),
        Some(TaskStatus::Pass)
    );
    assert_eq!(
        status(&orchestrator, TaskId::Grammar, DocumentSlot::Ce1),
        Some(TaskStatus::Pass)
    );
    assert!(orchestrator.in_flight().is_empty());
}

#[tokio::test]
async fn test_reference_phase_settles_after_rw_removed_between_runs() {
    let (client, _, orchestrator) = setup(&DocumentSlot::ALL);
    let phase_one = "format-comparison:file_1=ce1.pdf+file_2=ce2.pdf+file_3=ce3.pdf";
    client.reply(phase_one, json!({"consistency": {"all_match": true}}));
    let release_rw = client.gated(
        "format-comparison:file_1=ce1.pdf+file_2=ce2.pdf+file_3=rw.pdf",
        Ok(json!({"consistency": {"all_match": false}})),
    );
    client.reply(phase_one, json!({"consistency": {"all_match": true}}));

    let (first, _) = tokio::join!(orchestrator.run_task(TaskId::FormatComparison), async {
        tokio::task::yield_now().await;
        orchestrator.set_slot(DocumentSlot::Rw, None);
        let second = orchestrator
            .run_task(TaskId::FormatComparison)
            .await
            .unwrap();
        assert_eq!(second.report.calls, 1);
        release_rw.send(()).unwrap();
    });

    assert_eq!(first.unwrap().report.discarded, 0);
    assert_eq!(
        status(&orchestrator, TaskId::FormatComparison, DocumentSlot::Rw),
        Some(TaskStatus::Fail)
    );
    for slot in DocumentSlot::CE {
        assert_eq!(
            status(&orchestrator, TaskId::FormatComparison, slot),
            Some(TaskStatus::Pass)
        );
    }
    assert!(orchestrator.in_flight().is_empty());
}

#[tokio::test]
async fn test_dropped_invocation_releases_in_flight() {
    let (client, _, orchestrator) = setup(&[DocumentSlot::Ce2]);
    let _never = client.gated("grammar:ce2.pdf", Ok(json!({"status": "pass"})));

    let timed_out =
        tokio::time::timeout(Duration::from_millis(20), orchestrator.run_task(TaskId::Grammar))
            .await;

    assert!(timed_out.is_err());
    assert!(orchestrator.in_flight().is_empty());
    // 未完成的请求让槽位停留在 Loading
    assert_eq!(
        status(&orchestrator, TaskId::Grammar, DocumentSlot::Ce2),
        Some(TaskStatus::Loading)
    );
}

// ========== 格式切换 ==========

#[tokio::test]
async fn test_format_switch_clears_results_and_keeps_documents() {
    let (client, _, orchestrator) = setup(&[DocumentSlot::Ce1, DocumentSlot::Rw]);
    client.reply("grammar:ce1.pdf", json!({"status": "pass"}));
    client.reply("grammar:rw.pdf", json!({"status": "pass"}));
    orchestrator.run_task(TaskId::Grammar).await.unwrap();
    assert!(!orchestrator.get_all_results().is_empty());

    orchestrator.set_format(FileFormat::Docx);

    assert!(orchestrator.get_all_results().is_empty());
    assert_eq!(orchestrator.format(), FileFormat::Docx);
    assert_eq!(orchestrator.document(DocumentSlot::Ce1).unwrap().name, "ce1.pdf");
    assert_eq!(orchestrator.document(DocumentSlot::Rw).unwrap().name, "rw.pdf");
}

#[tokio::test]
async fn test_results_from_before_format_switch_are_discarded() {
    let (client, _, orchestrator) = setup(&[DocumentSlot::Ce1]);
    let release = client.gated("section-validation:ce1.pdf", Ok(json!({"status": "pass"})));

    let (outcome, _) = tokio::join!(orchestrator.run_task(TaskId::SectionValidation), async {
        tokio::task::yield_now().await;
        orchestrator.set_format(FileFormat::Docx);
        release.send(()).unwrap();
    });

    assert_eq!(outcome.unwrap().report.discarded, 1);
    assert!(orchestrator.get_all_results().is_empty());
}

// ========== 报告 ==========

#[tokio::test]
async fn test_generate_report_for_empty_slot_is_noop() {
    let (client, sink, orchestrator) = setup(&[DocumentSlot::Ce1]);

    let path = orchestrator
        .generate_report(DocumentSlot::Ce3, ReportAction::View)
        .await
        .unwrap();

    assert!(path.is_none());
    assert!(client.calls().is_empty());
    assert!(sink.delivered.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_generate_report_delivers_named_artifact() {
    let (client, sink, orchestrator) = setup(&[DocumentSlot::Ce2]);
    client
        .reports
        .lock()
        .unwrap()
        .insert("ce2.pdf".to_string(), Ok("<html>report</html>".to_string()));

    let path = orchestrator
        .generate_report(DocumentSlot::Ce2, ReportAction::Download)
        .await
        .unwrap();

    assert_eq!(path, Some(PathBuf::from("audit-report-ce2.html")));
    let delivered = sink.delivered.lock().unwrap();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].html, "<html>report</html>");
    assert_eq!(delivered[0].action, ReportAction::Download);
    assert!(orchestrator.get_all_results().is_empty());
    assert!(orchestrator.in_flight().is_empty());
}

#[tokio::test]
async fn test_generate_report_failure_leaves_store_untouched() {
    let (client, sink, orchestrator) = setup(&[DocumentSlot::Ce1]);
    client
        .reports
        .lock()
        .unwrap()
        .insert("ce1.pdf".to_string(), Err("HTTP 500".to_string()));

    let err = assert_err!(
        orchestrator
            .generate_report(DocumentSlot::Ce1, ReportAction::View)
            .await
    );
    assert!(err.to_string().contains("HTTP 500"));
    assert!(sink.delivered.lock().unwrap().is_empty());
    assert!(orchestrator.get_all_results().is_empty());
}
