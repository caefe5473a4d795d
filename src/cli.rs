// Copyright (c) 2018-2023  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! CLI (command line interface) mapping onto a [`RunConfig`].

use clap::Parser;

use crate::{config::RunConfig, tagexpr::TagExpr};

/// Run-control options of a test executor.
///
/// Parses the externally observed controls (tag expression, fail-fast and
/// hook-disable flags, concurrency) and converts them into a [`RunConfig`]
/// via [`Cli::into_config()`].
#[derive(Clone, Debug, Default, Parser)]
#[command(name = "zucchini", about = "Run the scenarios, eat a zucchini!")]
pub struct Cli {
    /// Number of scenarios to run concurrently. If not specified, uses the
    /// value configured in tests runner, or 64 by default.
    #[arg(long, short, value_name = "int", global = true)]
    pub concurrency: Option<usize>,

    /// Run tests until the first failure.
    #[arg(long, global = true, visible_alias = "ff")]
    pub fail_fast: bool,

    /// Tag expression to filter scenarios by.
    ///
    /// Note: Tags from Feature, Rule and Scenario are merged together on
    /// filtering, so be careful about conflicting tags on different levels.
    #[arg(
        id = "tags",
        long = "tags",
        short = 't',
        value_name = "tagexpr",
        global = true
    )]
    pub tags_filter: Option<TagExpr>,

    /// Skip every registered lifecycle hook.
    #[arg(long, global = true)]
    pub no_hooks: bool,
}

impl Cli {
    /// Shortcut for [`clap::Parser::parse()`], which doesn't require the
    /// trait being imported.
    #[must_use]
    pub fn parsed() -> Self {
        <Self as clap::Parser>::parse()
    }

    /// Converts these options into a [`RunConfig`], falling back to defaults
    /// for unspecified ones.
    #[must_use]
    pub fn into_config(self) -> RunConfig {
        let mut config = RunConfig::new();
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        config.fail_fast = self.fail_fast;
        config.disable_hooks = self.no_hooks;
        config.tag_filter = self.tags_filter;
        config
    }
}
