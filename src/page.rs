use crate::alert::AlertWindow;
use crate::camera::CameraAddress;

pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

pub fn render_index(window: &AlertWindow, camera: &CameraAddress, message: &str) -> String {
    let message = if message.is_empty() {
        String::new()
    } else {
        format!(r#"<p class="message">{}</p>"#, escape_html(message))
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Face Distance Alert</title>
</head>
<body>
<h1>Face Distance Alert</h1>
<img src="/video_feed" alt="Live video feed">
{message}
<form action="/set_distance" method="post">
<label>Minimum distance (cm) <input type="text" name="min_distance" value="{min}"></label>
<label>Maximum distance (cm) <input type="text" name="max_distance" value="{max}"></label>
<button type="submit">Set distance</button>
</form>
<form action="/set_camera_ip" method="post">
<label>Camera address <input type="text" name="camera_ip" value="{camera}"></label>
<button type="submit">Set camera</button>
</form>
</body>
</html>
"#,
        min = window.min_distance(),
        max = window.max_distance(),
        camera = escape_html(&camera.to_string()),
    )
}
