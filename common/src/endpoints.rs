pub const PATH_HEALTH_CHECK: &str = "/health_check";
pub const PATH_BUTTON_BOX_INFO: &str = "/button_box_info";
pub const PATH_CLOCK_START: &str = "/clock_start";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub base_url: String,
    pub health_check: String,
    pub button_box_info: String,
    pub clock_start: String,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Self {
        let base = base_url.trim().trim_end_matches('/');
        Self {
            base_url: base.to_string(),
            health_check: format!("{base}{PATH_HEALTH_CHECK}"),
            button_box_info: format!("{base}{PATH_BUTTON_BOX_INFO}"),
            clock_start: format!("{base}{PATH_CLOCK_START}"),
        }
    }
}
