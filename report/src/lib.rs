// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! XML rendering of analysis results.
//!
//! [`XmlReport`] collects conflicts as a [`ConflictSink`] and renders one
//! XML document per run. Four detail levels control how much of each rule
//! pair is echoed into the report; level 4 adds the per-dimension
//! relations. Conflicts are rendered at record time because the records
//! borrow their ACL's rules.

#![forbid(unsafe_code)]
#![deny(clippy::all)]

use classify::{Conflict, ConflictSink};
use model::{Dimension, PortSpec, Rule};
use std::fmt::Write as _;
use std::io::{self, Write};

/// How much of each conflicting rule pair the report carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DetailLevel {
    /// Conflict kind and rule names.
    One,
    /// Level 1 plus protocol, source range and action.
    Two,
    /// Level 2 plus ports and destination range.
    Three,
    /// Level 3 plus the per-dimension relations.
    Four,
}

/// A detail level outside 1 through 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("detail level {0} outside 1..=4")]
pub struct InvalidDetailLevel(pub u8);

impl DetailLevel {
    /// The numeric level, 1 through 4.
    #[must_use]
    pub fn as_number(self) -> u8 {
        match self {
            DetailLevel::One => 1,
            DetailLevel::Two => 2,
            DetailLevel::Three => 3,
            DetailLevel::Four => 4,
        }
    }
}

impl TryFrom<u8> for DetailLevel {
    type Error = InvalidDetailLevel;

    fn try_from(level: u8) -> Result<DetailLevel, InvalidDetailLevel> {
        match level {
            1 => Ok(DetailLevel::One),
            2 => Ok(DetailLevel::Two),
            3 => Ok(DetailLevel::Three),
            4 => Ok(DetailLevel::Four),
            other => Err(InvalidDetailLevel(other)),
        }
    }
}

/// One analyzed ACL's section of the report.
#[derive(Debug)]
struct Section {
    id: String,
    conflicts: Vec<String>,
}

/// XML report builder and sink.
#[derive(Debug)]
pub struct XmlReport {
    detail: DetailLevel,
    sections: Vec<Section>,
}

impl XmlReport {
    /// An empty report at the given detail level.
    #[must_use]
    pub fn new(detail: DetailLevel) -> XmlReport {
        XmlReport {
            detail,
            sections: Vec::new(),
        }
    }

    /// Total number of conflicts recorded so far.
    #[must_use]
    pub fn conflict_count(&self) -> usize {
        self.sections.iter().map(|s| s.conflicts.len()).sum()
    }

    /// Write the whole document.
    ///
    /// # Errors
    ///
    /// Propagates I/O failures from `out`.
    pub fn flush(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "<?xml version=\"1.0\" encoding=\"utf-8\"?>")?;
        writeln!(
            out,
            "<acl-analysis output-detail=\"{}\">",
            self.detail.as_number()
        )?;
        for section in &self.sections {
            if section.conflicts.is_empty() {
                writeln!(out, "  <access-list id=\"{}\"/>", escape(&section.id))?;
                continue;
            }
            writeln!(out, "  <access-list id=\"{}\">", escape(&section.id))?;
            for conflict in &section.conflicts {
                out.write_all(conflict.as_bytes())?;
            }
            writeln!(out, "  </access-list>")?;
        }
        writeln!(out, "</acl-analysis>")
    }

    /// Render a port attribute, wrapping negated specs in `not(...)`.
    fn port_attribute(spec: &PortSpec) -> String {
        if spec.negated() {
            format!("not({spec})")
        } else {
            spec.to_string()
        }
    }

    /// Render one rule element at the current detail level.
    fn rule_element(&self, tag: &str, rule: &Rule) -> String {
        let mut element = String::new();
        let _ = write!(element, "      <{tag} name=\"{}\"", escape(rule.name()));
        if self.detail >= DetailLevel::Two {
            let _ = write!(
                element,
                " proto=\"{}\" srcIP=\"{}\"",
                rule.protocol(),
                rule.src_ip()
            );
            if self.detail >= DetailLevel::Three {
                if rule.protocol().is_transport() {
                    let _ = write!(
                        element,
                        " srcPort=\"{}\"",
                        Self::port_attribute(rule.src_port())
                    );
                }
                let _ = write!(element, " dstIP=\"{}\"", rule.dst_ip());
                if rule.protocol().is_transport() {
                    let _ = write!(
                        element,
                        " dstPort=\"{}\"",
                        Self::port_attribute(rule.dst_port())
                    );
                }
            }
            let _ = write!(element, " action=\"{}\"", rule.action());
        }
        element.push_str("/>\n");
        element
    }

    fn render(&self, conflict: &Conflict<'_>) -> String {
        let mut block = String::new();
        let _ = writeln!(block, "    <conflict type=\"{}\">", conflict.kind());
        block.push_str(&self.rule_element("ruleX", conflict.rule_x()));
        block.push_str(&self.rule_element("ruleY", conflict.rule_y()));
        if self.detail >= DetailLevel::Four {
            let _ = writeln!(
                block,
                "      <relation proto=\"{}\" srcIP=\"{}\" srcPort=\"{}\" dstIP=\"{}\" dstPort=\"{}\"/>",
                conflict.relation(Dimension::Protocol),
                conflict.relation(Dimension::SrcIp),
                conflict.relation(Dimension::SrcPort),
                conflict.relation(Dimension::DstIp),
                conflict.relation(Dimension::DstPort),
            );
        }
        block.push_str("    </conflict>\n");
        block
    }
}

impl ConflictSink for XmlReport {
    fn begin_acl(&mut self, name: &str) {
        self.sections.push(Section {
            id: name.to_string(),
            conflicts: Vec::new(),
        });
    }

    fn conflict(&mut self, conflict: &Conflict<'_>) {
        let rendered = self.render(conflict);
        if self.sections.is_empty() {
            self.begin_acl("no-id");
        }
        if let Some(section) = self.sections.last_mut() {
            section.conflicts.push(rendered);
        }
    }
}

/// Escape a string for use in an XML attribute value.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
