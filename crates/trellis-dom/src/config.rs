/// What happens to node operations issued while no batch is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdleOperationPolicy {
    /// Each call is committed on its own, as if wrapped in a batch.
    #[default]
    Commit,
    /// Operations wait and are committed with the next batch.
    Defer,
}

/// Per-document settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentConfig {
    pub root_tag_name: String,
    pub root_view_name: String,
    /// Drop a node's touch listeners when the node is deleted.
    pub purge_touch_listeners_on_delete: bool,
    pub idle_operations: IdleOperationPolicy,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            root_tag_name: "root".to_owned(),
            root_view_name: "RootView".to_owned(),
            purge_touch_listeners_on_delete: true,
            idle_operations: IdleOperationPolicy::default(),
        }
    }
}

impl DocumentConfig {
    pub fn with_root_names(
        mut self,
        tag_name: impl Into<String>,
        view_name: impl Into<String>,
    ) -> Self {
        self.root_tag_name = tag_name.into();
        self.root_view_name = view_name.into();
        self
    }

    pub fn with_touch_purge(mut self, purge: bool) -> Self {
        self.purge_touch_listeners_on_delete = purge;
        self
    }

    pub fn with_idle_operations(mut self, policy: IdleOperationPolicy) -> Self {
        self.idle_operations = policy;
        self
    }
}
