// Copyright (c) 2018-2023  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! [`gherkin::Feature`] extension expanding [`Scenario Outline`][1]s.
//!
//! [1]: https://cucumber.io/docs/gherkin/reference#scenario-outline

use std::{
    iter, mem,
    path::{Path, PathBuf},
};

use derive_more::with_trait::{Display, Error};
use lazy_regex::regex;
use once_cell::sync::Lazy;
use regex::Regex;
use sealed::sealed;

/// Helper methods to operate on [`gherkin::Feature`]s.
#[sealed]
pub trait Ext: Sized {
    /// Expands [`Scenario Outline`][1] [`Examples`][2].
    ///
    /// Every [`Examples`][2] row becomes an independent scenario: each
    /// `<placeholder>` occurrence in the scenario name, step texts,
    /// docstrings and data-table cells is substituted with the row's value
    /// for that column, the block's tags are merged into the scenario's
    /// tags, and the name is suffixed with the block's name (if any) and
    /// the 1-based row number:
    ///
    /// ```gherkin
    /// Feature: Hungry
    ///   Scenario Outline: eating
    ///     Given there are <start> cucumbers
    ///     When I eat <eat> cucumbers
    ///     Then I should have <left> cucumbers
    ///
    ///     Examples:
    ///       | start | eat | left |
    ///       |    12 |   5 |    7 |
    ///       |    20 |   4 |   16 |
    /// ```
    ///
    /// Expands into `eating (#1)` (12/5/7) and `eating (#2)` (20/4/16).
    /// Row numbering restarts for every [`Examples`][2] block.
    ///
    /// # Errors
    ///
    /// If a `<placeholder>` doesn't match any column of the [`Examples`][2]
    /// block being expanded. See [`ExpandExamplesError`] for details.
    ///
    /// [1]: https://cucumber.io/docs/gherkin/reference#scenario-outline
    /// [2]: https://cucumber.io/docs/gherkin/reference#examples
    fn expand_examples(self) -> Result<Self, ExpandExamplesError>;
}

#[sealed]
impl Ext for gherkin::Feature {
    fn expand_examples(mut self) -> Result<Self, ExpandExamplesError> {
        let path = self.path.clone();
        let expand = |scenarios: Vec<gherkin::Scenario>| -> Result<_, _> {
            scenarios
                .into_iter()
                .flat_map(|s| expand_scenario(s, path.as_ref()))
                .collect()
        };

        for r in &mut self.rules {
            r.scenarios = expand(mem::take(&mut r.scenarios))?;
        }
        self.scenarios = expand(mem::take(&mut self.scenarios))?;

        Ok(self)
    }
}

/// Expands [`Scenario`] [`Examples`], if any.
///
/// # Errors
///
/// See [`ExpandExamplesError`] for details.
///
/// [`Examples`]: gherkin::Examples
/// [`Scenario`]: gherkin::Scenario
fn expand_scenario(
    scenario: gherkin::Scenario,
    path: Option<&PathBuf>,
) -> Vec<Result<gherkin::Scenario, ExpandExamplesError>> {
    /// [`Regex`] matching placeholders [`Examples`] should expand into.
    ///
    /// [`Examples`]: gherkin::Examples
    static TEMPLATE_REGEX: &Lazy<Regex> = regex!(r"<([^>\s]+)>");

    if scenario.examples.is_empty() {
        return vec![Ok(scenario)];
    }

    scenario
        .examples
        .iter()
        .filter_map(|ex| {
            ex.table
                .as_ref()?
                .rows
                .split_first()
                .map(|(h, v)| (h, v, ex))
        })
        .flat_map(|(header, vals, example)| {
            vals.iter()
                .map(|v| header.iter().zip(v))
                .enumerate()
                .zip(iter::repeat((
                    example.position,
                    example.tags.iter(),
                    examples_label(example),
                )))
        })
        .map(|((id, row), (position, tags, label))| {
            let replace_templates = |str: &str, pos| {
                let mut err = None;
                let replaced = TEMPLATE_REGEX
                    .replace_all(str, |cap: &regex::Captures<'_>| {
                        // PANIC: Unwrapping is OK here as `TEMPLATE_REGEX`
                        //        contains this capture group.
                        #[allow(clippy::unwrap_used)]
                        let name = cap.get(1).unwrap().as_str();

                        row.clone()
                            .find_map(|(k, v)| {
                                (name == k).then_some(v.as_str())
                            })
                            .unwrap_or_else(|| {
                                err = Some(ExpandExamplesError {
                                    pos,
                                    name: name.to_owned(),
                                    path: path.cloned(),
                                });
                                ""
                            })
                    })
                    .into_owned();

                err.map_or_else(|| Ok(replaced), Err)
            };

            let mut expanded = scenario.clone();

            // This is done to differentiate `Hash`es of
            // scenario outlines with the same examples.
            expanded.position = position;
            expanded.position.line += id + 2;

            expanded.tags.extend(tags.cloned());

            let base = replace_templates(&expanded.name, expanded.position)?;
            expanded.name = outline_name(&base, label, id + 1);
            for s in &mut expanded.steps {
                for value in iter::once(&mut s.value)
                    .chain(s.docstring.iter_mut())
                    .chain(s.table.iter_mut().flat_map(|t| {
                        t.rows.iter_mut().flat_map(|r| r.iter_mut())
                    }))
                {
                    *value = replace_templates(value, s.position)?;
                }
            }

            Ok(expanded)
        })
        .collect()
}

/// Name of the given [`Examples`] block, if it carries a non-empty one.
///
/// [`Examples`]: gherkin::Examples
fn examples_label(example: &gherkin::Examples) -> Option<&str> {
    example.name.as_deref().filter(|n| !n.is_empty())
}

/// Synthesizes the name of an expanded scenario out of its original name,
/// the [`Examples`] block's `label` and the 1-based `row` number.
///
/// [`Examples`]: gherkin::Examples
fn outline_name(base: &str, label: Option<&str>, row: usize) -> String {
    label.map_or_else(
        || format!("{base} (#{row})"),
        |l| format!("{base} -- {l} (#{row})"),
    )
}

/// Error of [`Scenario Outline`][1] expansion encountering an unknown
/// template.
///
/// This is a configuration error aborting the whole run.
///
/// [1]: https://cucumber.io/docs/gherkin/reference#scenario-outline
#[derive(Clone, Debug, Display, Error)]
#[display(
    "failed to resolve <{name}> at {}:{}:{}",
    path.as_deref().and_then(Path::to_str).unwrap_or_default(),
    pos.line,
    pos.col,
)]
pub struct ExpandExamplesError {
    /// Position of the unknown template.
    pub pos: gherkin::LineCol,

    /// Name of the unknown template.
    pub name: String,

    /// [`Path`] to the `.feature` file, if present.
    pub path: Option<PathBuf>,
}
