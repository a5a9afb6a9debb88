pub(crate) const PANEL_ROOT_ID: &str = "exitPanel";
pub(crate) const CURRENT_MODE_ID: &str = "currentMode";
pub(crate) const NODE_LIST_ID: &str = "exitNodesList";
pub(crate) const PAGE_INFO_ID: &str = "pageInfo";
pub(crate) const PREV_PAGE_ID: &str = "prevPage";
pub(crate) const NEXT_PAGE_ID: &str = "nextPage";
pub(crate) const DIRECT_MODE_ID: &str = "directMode";
pub(crate) const LOGOUT_ID: &str = "logoutButton";
pub(crate) const INFO_BOX_ID: &str = "infoBox";

pub(crate) const NODE_DATA_ATTRIBUTE: &str = "data-node";
pub(crate) const BROWSER_CONFIG_GLOBAL: &str = "__EXIT_PANEL_CONFIG__";
