//! Status API Adapter - 转码后端客户端实现

mod http_status_client;
mod scripted_status_client;

pub use http_status_client::{HttpStatusClient, HttpStatusClientConfig};
pub use scripted_status_client::{ScriptedResponse, ScriptedStatusClient};

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::domain::{Resolution, TaskId};

/// 默认后端地址
pub(crate) const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// API 路由前缀
const API_PREFIX: &str = "/api/v1";

/// 单个路径段中需要转义的字符
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// 任务 ID、分辨率等不透明值作为一个完整路径段写入 URL
fn segment(raw: &str) -> String {
    utf8_percent_encode(raw, PATH_SEGMENT).to_string()
}

pub(crate) fn status_url(base_url: &str, task_id: &TaskId) -> String {
    format!(
        "{}{}/tasks/{}/status",
        base_url,
        API_PREFIX,
        segment(task_id.as_str())
    )
}

pub(crate) fn upload_url(base_url: &str) -> String {
    format!("{}{}/upload", base_url, API_PREFIX)
}

pub(crate) fn cancel_url(base_url: &str, task_id: &TaskId) -> String {
    format!(
        "{}{}/tasks/{}/cancel",
        base_url,
        API_PREFIX,
        segment(task_id.as_str())
    )
}

pub(crate) fn download_url(
    base_url: &str,
    task_id: &TaskId,
    resolution: Option<&Resolution>,
) -> String {
    let task = segment(task_id.as_str());
    match resolution {
        Some(resolution) => format!(
            "{}{}/download/{}/{}",
            base_url,
            API_PREFIX,
            task,
            segment(resolution.as_str())
        ),
        None => format!("{}{}/tasks/{}/download", base_url, API_PREFIX, task),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_ids_are_unchanged() {
        let task_id = TaskId::new("3f2a-91c0_x.y").unwrap();
        assert_eq!(
            status_url("http://h", &task_id),
            "http://h/api/v1/tasks/3f2a-91c0_x.y/status"
        );
    }

    #[test]
    fn test_reserved_characters_stay_inside_one_segment() {
        let task_id = TaskId::new("abc/../../upload?x=").unwrap();
        assert_eq!(
            status_url("http://h", &task_id),
            "http://h/api/v1/tasks/abc%2F..%2F..%2Fupload%3Fx=/status"
        );

        let task_id = TaskId::new("a/b?c#d").unwrap();
        assert_eq!(
            cancel_url("http://h", &task_id),
            "http://h/api/v1/tasks/a%2Fb%3Fc%23d/cancel"
        );
        assert_eq!(
            download_url("http://h", &task_id, Some(&Resolution::new("720 p"))),
            "http://h/api/v1/download/a%2Fb%3Fc%23d/720%20p"
        );
        assert_eq!(
            download_url("http://h", &task_id, None),
            "http://h/api/v1/tasks/a%2Fb%3Fc%23d/download"
        );
    }

    #[test]
    fn test_encoded_url_keeps_endpoint_path() {
        let task_id = TaskId::new("abc/../../upload?x=").unwrap();
        let url = reqwest::Url::parse(&status_url("http://h", &task_id)).unwrap();
        assert_eq!(url.query(), None);
        assert_eq!(
            url.path_segments().unwrap().collect::<Vec<_>>(),
            vec!["api", "v1", "tasks", "abc%2F..%2F..%2Fupload%3Fx=", "status"]
        );
    }
}
