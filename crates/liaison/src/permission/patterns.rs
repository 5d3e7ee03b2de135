use std::collections::HashSet;

/// A write-operation pattern with its confirmation treatment.
///
/// `pattern` is a lower-case substring matched against the tool name and the
/// normalized `command` argument. `complex` operations get a structured
/// multi-field summary instead of a plain yes/no prompt.
#[derive(Debug, Clone)]
pub struct WritePattern {
    pub pattern: &'static str,
    pub description: &'static str,
    pub complex: bool,
}

/// Ordered table of write-operation patterns. First match wins.
#[derive(Debug, Clone)]
pub struct WritePatternSet {
    patterns: Vec<WritePattern>,
}

impl WritePatternSet {
    pub fn new(patterns: Vec<WritePattern>) -> Self {
        Self { patterns }
    }

    /// The built-in table covering work-item and repository mutations.
    ///
    /// Order matters: more specific patterns come before the generic verbs
    /// they contain.
    pub fn builtin() -> Self {
        Self::new(vec![
            WritePattern {
                pattern: "create_work_item",
                description: "Create a new work item",
                complex: true,
            },
            WritePattern {
                pattern: "update_work_item",
                description: "Update an existing work item",
                complex: true,
            },
            WritePattern {
                pattern: "delete",
                description: "Delete a resource",
                complex: true,
            },
            WritePattern {
                pattern: "git push",
                description: "Push commits to a remote repository",
                complex: true,
            },
            WritePattern {
                pattern: "create_branch",
                description: "Create a repository branch",
                complex: false,
            },
            WritePattern {
                pattern: "merge",
                description: "Merge changes",
                complex: true,
            },
            WritePattern {
                pattern: "add_comment",
                description: "Add a comment",
                complex: false,
            },
            WritePattern {
                pattern: "assign",
                description: "Change an assignment",
                complex: false,
            },
            WritePattern {
                pattern: "create",
                description: "Create a resource",
                complex: false,
            },
            WritePattern {
                pattern: "update",
                description: "Update a resource",
                complex: false,
            },
            WritePattern {
                pattern: "write",
                description: "Write data",
                complex: false,
            },
        ])
    }

    /// Match a tool call against the table.
    ///
    /// Both the tool name and the `command` string argument (when present)
    /// are normalized to lower case and scanned for each pattern substring
    /// in declaration order.
    pub fn find_match(
        &self,
        tool_name: &str,
        input: &serde_json::Value,
    ) -> Option<&WritePattern> {
        let name = tool_name.to_lowercase();
        let command = input
            .get("command")
            .and_then(|v| v.as_str())
            .map(|s| s.to_lowercase());

        self.patterns.iter().find(|p| {
            name.contains(p.pattern)
                || command.as_deref().is_some_and(|c| c.contains(p.pattern))
        })
    }
}

/// Tool names that never need confirmation. Consulted before the write
/// pattern table.
#[derive(Debug, Clone)]
pub struct ReadOnlyAllowlist {
    names: HashSet<&'static str>,
}

impl ReadOnlyAllowlist {
    pub fn new(names: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }

    pub fn builtin() -> Self {
        Self::new([
            "query_work_items",
            "get_work_item",
            "list_work_items",
            "list_branches",
            "list_pull_requests",
            "get_pull_request",
            "read_file",
            "search_code",
            "get_build_status",
            "show_help",
        ])
    }

    pub fn contains(&self, tool_name: &str) -> bool {
        self.names.contains(tool_name)
    }
}
