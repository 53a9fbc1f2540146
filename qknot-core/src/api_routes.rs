macro_rules! jobs_path {
    ($path:literal) => {
        concat!("/api/jobs", $path)
    };
}

pub mod jobs {
    pub const SUBMIT: &str = jobs_path!("/submit");
    pub const POLL: &str = jobs_path!("/poll");
    pub const CANCEL: &str = jobs_path!("/cancel");
}

pub mod backends {
    pub const LIST: &str = "/api/backends";
}

/// Join a route onto a base URL without doubling or dropping the slash.
pub fn join(base_url: &str, route: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        route.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_routes_share_prefix() {
        assert_eq!(jobs::SUBMIT, "/api/jobs/submit");
        assert_eq!(jobs::POLL, "/api/jobs/poll");
        assert_eq!(jobs::CANCEL, "/api/jobs/cancel");
    }

    #[test]
    fn join_normalizes_slashes() {
        assert_eq!(
            join("http://127.0.0.1:8000/", jobs::POLL),
            "http://127.0.0.1:8000/api/jobs/poll"
        );
        assert_eq!(
            join("http://host", "api/backends"),
            "http://host/api/backends"
        );
    }
}
