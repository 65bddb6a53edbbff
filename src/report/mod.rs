// Run-scoped accumulation of verification outcomes and the operator summary
use std::fmt::Write;

use crate::verification::models::{AttentionRecord, SoftFailure, VerificationOutcome};

/// Mutable state shared by the phases of a single run
#[derive(Debug)]
pub struct RunContext {
    max_failures: u32,
    hard_failures: u32,
    total_records: usize,
    attention: Vec<AttentionRecord>,
    soft_errors: Vec<SoftFailure>,
}

impl RunContext {
    pub fn new(max_failures: u32) -> Self {
        Self {
            max_failures,
            hard_failures: 0,
            total_records: 0,
            attention: Vec::new(),
            soft_errors: Vec::new(),
        }
    }

    pub fn max_failures(&self) -> u32 {
        self.max_failures
    }

    pub fn hard_failures(&self) -> u32 {
        self.hard_failures
    }

    /// No further verification calls are allowed once this is true
    pub fn ceiling_reached(&self) -> bool {
        self.hard_failures >= self.max_failures
    }

    pub fn set_total_records(&mut self, total: usize) {
        self.total_records = total;
    }

    pub fn record(&mut self, outcome: VerificationOutcome) {
        match outcome {
            VerificationOutcome::Authorized(record) => self.attention.push(record),
            VerificationOutcome::NotAuthorized => {}
            VerificationOutcome::Failed(failure) => {
                self.hard_failures += 1;
                self.soft_errors.push(failure);
            }
        }
    }

    pub fn attention(&self) -> &[AttentionRecord] {
        &self.attention
    }

    pub fn soft_errors(&self) -> &[SoftFailure] {
        &self.soft_errors
    }

    pub fn into_report(self) -> RunReport {
        RunReport {
            total_records: self.total_records,
            attention: self.attention,
            soft_errors: self.soft_errors,
        }
    }
}

/// Final result of a run that completed without a fatal condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub total_records: usize,
    pub attention: Vec<AttentionRecord>,
    pub soft_errors: Vec<SoftFailure>,
}

impl RunReport {
    /// Plain-text body of the end-of-run email
    pub fn render_summary(&self) -> String {
        let mut body = String::from("Resumen de ejecución:\n");
        let _ = writeln!(body, "- Total procesados: {}", self.total_records);
        let _ = writeln!(body, "- Alertas detectadas: {}", self.attention.len());
        body.push('\n');

        if !self.attention.is_empty() {
            body.push_str("REGISTROS QUE REQUIEREN ATENCIÓN:\n");
            for record in &self.attention {
                let _ = writeln!(
                    body,
                    "ID: {} | TIPO: {} | DB: {} | CLIENTE: {}",
                    record.id, record.kind, record.database, record.client
                );
            }
        }

        if !self.soft_errors.is_empty() {
            body.push_str("\nERRORES NO BLOQUEANTES DURANTE LA EJECUCIÓN:\n");
            let lines: Vec<String> = self
                .soft_errors
                .iter()
                .map(SoftFailure::report_line)
                .collect();
            body.push_str(&lines.join("\n"));
        }

        body
    }
}
