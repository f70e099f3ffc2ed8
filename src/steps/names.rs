//! Step names understood by the step script.

/// Run-level login, executed once before any deployment.
pub const SET_AZURE_ACCOUNT: &str = "set_azure_account";
/// Run-level secret download, executed once after login.
pub const GET_SECRETS: &str = "get_secrets";

pub const CREATE_RESOURCE_GROUP: &str = "create_resource_group";
pub const PREDEPLOY: &str = "predeploy";
pub const GENERATE_TEMPLATE: &str = "generate_template";
pub const DEPLOY_TEMPLATE: &str = "deploy_template";
pub const POSTDEPLOY: &str = "postdeploy";
pub const VALIDATE: &str = "validate";
pub const CLEANUP: &str = "cleanup";

/// Discovery: prints the orchestrator type for `CLUSTER_DEFINITION`.
pub const GET_ORCHESTRATOR_TYPE: &str = "get_orchestrator_type";
/// Discovery: prints the expected orchestrator version.
pub const GET_ORCHESTRATOR_VERSION: &str = "get_orchestrator_version";
/// Discovery: prints `nodes:linux_agents:windows_agents`.
pub const GET_NODE_COUNT: &str = "get_node_count";

/// The main sequence of one attempt. Cleanup follows unconditionally.
pub const ORDERED_STEPS: [&str; 6] = [
    CREATE_RESOURCE_GROUP,
    PREDEPLOY,
    GENERATE_TEMPLATE,
    DEPLOY_TEMPLATE,
    POSTDEPLOY,
    VALIDATE,
];
