// ============================================================
// Layer 1 — Console Reporter
// ============================================================
// Prints stage banners, the metrics block and the importance
// table to stdout. Logs go to stderr through tracing, so piping
// stdout keeps only the report.

use crate::application::observer::{RunObserver, Stage};
use crate::ml::{
    classifier::TrainedModel,
    evaluator::BinaryClassificationMetrics,
    importance::FeatureImportance,
};

const RULE_WIDTH: usize = 60;

pub struct ConsoleReporter;

impl RunObserver for ConsoleReporter {
    fn stage(&self, stage: Stage) {
        let line = format!("=============== {} ===============", stage.banner());
        println!();
        println!("{line}");
        println!("{}", "#".repeat(line.len()));
    }

    fn metrics(&self, model: &TrainedModel, metrics: &BinaryClassificationMetrics) {
        println!("{}", metrics_block(model, metrics));
    }

    fn importance(&self, ranked: &[FeatureImportance]) {
        println!("{}", importance_table(ranked));
    }
}

pub fn metrics_block(model: &TrainedModel, m: &BinaryClassificationMetrics) -> String {
    let rows = [
        ("Accuracy", m.accuracy),
        ("Area Under Curve", m.auc),
        ("Area under Precision recall Curve", m.auprc),
        ("F1Score", m.f1_score),
        ("LogLoss", m.log_loss),
        ("LogLossReduction", m.log_loss_reduction),
        ("PositivePrecision", m.positive_precision),
        ("PositiveRecall", m.positive_recall),
        ("NegativePrecision", m.negative_precision),
        ("NegativeRecall", m.negative_recall),
    ];

    let stars = "*".repeat(RULE_WIDTH);
    let mut out = String::new();
    out.push_str(&stars);
    out.push('\n');
    out.push_str(&format!("*       Metrics for {model}\n"));
    out.push_str(&format!("*{}\n", "-".repeat(RULE_WIDTH - 1)));
    for (name, value) in rows {
        out.push_str(&format!("*       {name}: {value:.4}\n"));
    }
    let c = &m.confusion;
    out.push_str(&format!(
        "*       Confusion: TP={} FP={} TN={} FN={}\n",
        c.true_positives, c.false_positives, c.true_negatives, c.false_negatives
    ));
    out.push_str(&stars);
    out
}

pub fn importance_table(ranked: &[FeatureImportance]) -> String {
    let mut out = String::from(
        "Feature\tModel Weight\tChange in AUC\t95% Confidence in the Mean Change in AUC",
    );
    for f in ranked {
        let weight = f.weight.map_or_else(|| "-".to_string(), |w| format!("{w:.4}"));
        out.push_str(&format!(
            "\n{}\t{}\t{:.4}\t{:.4}",
            f.name,
            weight,
            f.auc_delta.mean,
            f.auc_delta.confidence_95()
        ));
    }
    out
}
