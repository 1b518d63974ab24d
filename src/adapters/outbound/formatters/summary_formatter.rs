use crate::ports::outbound::ReportFormatter;
use crate::sbom_generation::domain::{RiskLevel, ScanResult, SupplyChainReport};
use crate::shared::Result;

/// Markdown table header for high-risk packages
const RISK_TABLE_HEADER: &str = "| Package | Risk | Score | Vulnerabilities |\n";
const RISK_TABLE_SEPARATOR: &str = "|---------|------|-------|-----------------|\n";

/// Markdown table header for supply-chain findings
const SUPPLY_CHAIN_TABLE_HEADER: &str = "| Package | Manager | Risk | Score | Factors |\n";
const SUPPLY_CHAIN_TABLE_SEPARATOR: &str = "|---------|---------|------|-------|---------|\n";

/// SummaryFormatter renders a human-readable Markdown digest of each scan.
///
/// Sections: project totals, vulnerability tallies, package risk tallies,
/// the high and critical packages, and the supply-chain findings sorted by
/// descending score.
pub struct SummaryFormatter;

impl SummaryFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Escapes pipe characters and newlines for safe Markdown table rendering
    fn escape_markdown_table_cell(text: &str) -> String {
        text.replace('|', "\\|").replace('\n', " ")
    }

    fn join_or_none(items: &[String]) -> String {
        if items.is_empty() {
            "none".to_string()
        } else {
            items.join(", ")
        }
    }
}

impl Default for SummaryFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper methods for rendering sections
impl SummaryFormatter {
    fn render_result(&self, output: &mut String, result: &ScanResult) {
        let sbom = &result.sbom;
        output.push_str(&format!("# Dependency Report: {}\n\n", sbom.project_name));
        output.push_str(&format!("- **Path:** {}\n", sbom.project_path));
        output.push_str(&format!(
            "- **Scanned:** {} ({:.2}s)\n",
            result.scan_timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            result.scan_duration_seconds
        ));
        output.push_str(&format!("- **Packages:** {}\n", sbom.total_packages()));
        output.push_str(&format!(
            "- **Direct / Transitive:** {} / {}\n",
            sbom.direct_dependencies(),
            sbom.transitive_dependencies()
        ));
        output.push_str(&format!(
            "- **Languages:** {}\n",
            Self::join_or_none(sbom.languages())
        ));
        output.push_str(&format!(
            "- **Package managers:** {}\n\n",
            Self::join_or_none(sbom.package_managers())
        ));

        for note in &result.annotations {
            output.push_str(&format!("> ⚠️ {}\n\n", note));
        }

        self.render_tallies(output, result);
        self.render_high_risk_packages(output, result);
        if let Some(reports) = &result.supply_chain_intelligence {
            self.render_supply_chain(output, reports);
        }
    }

    fn render_tallies(&self, output: &mut String, result: &ScanResult) {
        output.push_str("## Vulnerabilities\n\n");
        output.push_str(&format!(
            "**Found {} {}** (critical: {}, high: {}, medium: {}, low: {})\n\n",
            result.total_vulnerabilities,
            if result.total_vulnerabilities == 1 {
                "vulnerability"
            } else {
                "vulnerabilities"
            },
            result.critical_vulnerabilities,
            result.high_vulnerabilities,
            result.medium_vulnerabilities,
            result.low_vulnerabilities
        ));
        output.push_str("## Package Risk\n\n");
        output.push_str(&format!(
            "critical: {}, high: {}, medium: {}, low: {}\n\n",
            result.critical_risk_packages,
            result.high_risk_packages,
            result.medium_risk_packages,
            result.low_risk_packages
        ));
    }

    fn render_high_risk_packages(&self, output: &mut String, result: &ScanResult) {
        let mut risky: Vec<_> = result
            .risks
            .iter()
            .filter(|r| r.overall_risk >= RiskLevel::High)
            .collect();
        if risky.is_empty() {
            return;
        }
        risky.sort_by(|a, b| {
            b.risk_score
                .total_cmp(&a.risk_score)
                .then_with(|| a.package_purl.cmp(&b.package_purl))
        });

        output.push_str("### High and Critical Packages\n\n");
        output.push_str(RISK_TABLE_HEADER);
        output.push_str(RISK_TABLE_SEPARATOR);
        for risk in risky {
            let ids: Vec<&str> = risk.vulnerabilities.iter().map(|v| v.id.as_str()).collect();
            output.push_str(&format!(
                "| {} | {} | {:.1} | {} |\n",
                Self::escape_markdown_table_cell(&risk.package_purl),
                risk.overall_risk,
                risk.risk_score,
                Self::escape_markdown_table_cell(&ids.join(", "))
            ));
        }
        output.push('\n');
    }

    fn render_supply_chain(&self, output: &mut String, reports: &[SupplyChainReport]) {
        output.push_str("## Supply-Chain Findings\n\n");

        let mut flagged: Vec<&SupplyChainReport> = reports
            .iter()
            .filter(|r| !r.supply_chain_risk.risk_factors.is_empty())
            .collect();
        if flagged.is_empty() {
            output.push_str("*No supply-chain risk factors detected*\n\n");
            return;
        }
        flagged.sort_by(|a, b| {
            b.supply_chain_risk
                .risk_score
                .total_cmp(&a.supply_chain_risk.risk_score)
                .then_with(|| a.package_name.cmp(&b.package_name))
        });

        output.push_str(SUPPLY_CHAIN_TABLE_HEADER);
        output.push_str(SUPPLY_CHAIN_TABLE_SEPARATOR);
        for report in flagged {
            let risk = &report.supply_chain_risk;
            output.push_str(&format!(
                "| {}@{} | {} | {} | {:.1} | {} |\n",
                Self::escape_markdown_table_cell(&report.package_name),
                Self::escape_markdown_table_cell(&report.version),
                report.package_manager,
                risk.risk_level,
                risk.risk_score,
                Self::escape_markdown_table_cell(&risk.risk_factors.join("; "))
            ));
        }
        output.push('\n');
    }
}

impl ReportFormatter for SummaryFormatter {
    fn format(&self, results: &[ScanResult]) -> Result<String> {
        let mut output = String::new();
        for (index, result) in results.iter().enumerate() {
            if index > 0 {
                output.push_str("\n---\n\n");
            }
            self.render_result(&mut output, result);
        }
        Ok(output)
    }
}
