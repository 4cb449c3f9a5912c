//! Viewer module - generates an HTML page for one DICOM image with
//! window/level controls.

use crate::render::RenderOutput;

/// Escape HTML special characters to prevent XSS attacks.
fn html_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Percent-encode each path segment, keeping the separators.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Show an empty field as a dash.
fn or_dash(value: &str) -> String {
    if value.is_empty() {
        "-".to_string()
    } else {
        html_escape(value)
    }
}

/// Generate the viewer page for a rendered file.
///
/// # Arguments
///
/// * `path` - File key (URL-encoded per segment in image URLs)
/// * `output` - Initial render, supplying metadata and the starting window
pub fn generate_viewer_html(path: &str, output: &RenderOutput) -> String {
    let image_url = format!("/image/{}", encode_path(path));
    let metadata = &output.metadata;

    let escaped_path = html_escape(path);
    let patient_name = or_dash(&metadata.patient_name);
    let patient_id = or_dash(&metadata.patient_id);
    let study_date = or_dash(&metadata.study_date);
    let modality = or_dash(&metadata.modality);
    let series_description = or_dash(&metadata.series_description);

    // Slider bounds cover the stored window and the raw pixel range
    let range_span = (output.range.max - output.range.min).max(1) as f64;
    let width_max = range_span.max(output.window.width).max(4096.0).ceil();
    let center_min = (output.range.min as f64)
        .min(output.window.center)
        .min(-1024.0)
        .floor();
    let center_max = (output.range.max as f64)
        .max(output.window.center)
        .max(1024.0)
        .ceil();

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>DICOM Viewer - {escaped_path}</title>
    <style>
        * {{
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }}
        body {{
            background: #0f0f0f;
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, sans-serif;
            overflow: hidden;
        }}
        #viewer {{
            width: 100vw;
            height: 100vh;
            display: flex;
            align-items: center;
            justify-content: center;
        }}
        #image {{
            max-width: 100%;
            max-height: 100%;
            image-rendering: pixelated;
        }}
        .info-panel {{
            position: absolute;
            top: 16px;
            left: 16px;
            background: rgba(0, 0, 0, 0.85);
            color: #fff;
            padding: 16px 20px;
            border-radius: 8px;
            font-size: 13px;
            line-height: 1.5;
            backdrop-filter: blur(10px);
            border: 1px solid rgba(255, 255, 255, 0.1);
            max-width: 320px;
            z-index: 1000;
        }}
        .info-panel h2 {{
            font-size: 14px;
            font-weight: 600;
            margin-bottom: 8px;
            color: #fff;
            word-break: break-all;
        }}
        .info-panel .meta {{
            color: rgba(255, 255, 255, 0.7);
            font-size: 12px;
        }}
        .info-panel .meta span {{
            color: rgba(255, 255, 255, 0.9);
        }}
        .info-panel .modality-badge {{
            display: inline-block;
            background: rgba(99, 102, 241, 0.2);
            color: #818cf8;
            padding: 2px 8px;
            border-radius: 4px;
            font-size: 11px;
            font-weight: 500;
            margin-top: 8px;
        }}
        .window-panel {{
            position: absolute;
            bottom: 16px;
            left: 16px;
            background: rgba(0, 0, 0, 0.7);
            color: rgba(255, 255, 255, 0.8);
            padding: 12px 16px;
            border-radius: 6px;
            font-size: 12px;
            backdrop-filter: blur(10px);
            z-index: 1000;
        }}
        .window-panel label {{
            display: block;
            margin-bottom: 6px;
        }}
        .window-panel input[type=range] {{
            width: 240px;
            vertical-align: middle;
        }}
        .window-panel button {{
            background: rgba(255, 255, 255, 0.15);
            color: #fff;
            border: none;
            padding: 4px 10px;
            border-radius: 3px;
            margin-right: 6px;
            cursor: pointer;
        }}
        .error-banner {{
            position: absolute;
            top: 0;
            left: 0;
            right: 0;
            background: rgba(220, 38, 38, 0.95);
            color: white;
            padding: 12px 20px;
            font-size: 14px;
            z-index: 1000;
            display: none;
            backdrop-filter: blur(10px);
        }}
        .error-banner.visible {{
            display: block;
        }}
    </style>
</head>
<body>
    <div id="error-banner" class="error-banner"></div>

    <div id="viewer">
        <img id="image" alt="{escaped_path}">
    </div>

    <div class="info-panel">
        <h2>{escaped_path}</h2>
        <div class="meta">
            Patient: <span>{patient_name}</span> (<span>{patient_id}</span>)<br>
            Study date: <span>{study_date}</span><br>
            Series: <span>{series_description}</span><br>
            <span>{width}</span> x <span>{height}</span> px<br>
            Pixel range: <span>{range_min}</span> to <span>{range_max}</span>
        </div>
        <div class="modality-badge">{modality}</div>
    </div>

    <div class="window-panel">
        <label>Width <input id="ww" type="range" min="1" max="{width_max}" step="1" value="{window_width}">
            <span id="ww-value">{window_width}</span></label>
        <label>Center <input id="wc" type="range" min="{center_min}" max="{center_max}" step="1" value="{window_center}">
            <span id="wc-value">{window_center}</span></label>
        <button id="auto">Auto</button>
        <button id="reset">Reset</button>
    </div>

    <script>
        const imageUrl = "{image_url}";
        const initial = {{ width: {window_width}, center: {window_center} }};
        const image = document.getElementById('image');
        const ww = document.getElementById('ww');
        const wc = document.getElementById('wc');
        const banner = document.getElementById('error-banner');
        let pending = null;

        function load(query) {{
            fetch(imageUrl + query)
                .then(function(response) {{
                    if (!response.ok) {{
                        return response.json().then(function(body) {{
                            throw new Error(body.error || response.statusText);
                        }});
                    }}
                    const width = response.headers.get('X-Window-Width');
                    const center = response.headers.get('X-Window-Center');
                    if (width !== null) {{ ww.value = width; document.getElementById('ww-value').textContent = width; }}
                    if (center !== null) {{ wc.value = center; document.getElementById('wc-value').textContent = center; }}
                    return response.blob();
                }})
                .then(function(blob) {{
                    const previous = image.src;
                    image.src = URL.createObjectURL(blob);
                    if (previous) URL.revokeObjectURL(previous);
                    banner.classList.remove('visible');
                }})
                .catch(function(error) {{
                    banner.textContent = 'Failed to render image: ' + error.message;
                    banner.classList.add('visible');
                }});
        }}

        function applyWindow() {{
            document.getElementById('ww-value').textContent = ww.value;
            document.getElementById('wc-value').textContent = wc.value;
            clearTimeout(pending);
            pending = setTimeout(function() {{
                load('?window_width=' + ww.value + '&window_center=' + wc.value);
            }}, 120);
        }}

        ww.addEventListener('input', applyWindow);
        wc.addEventListener('input', applyWindow);
        document.getElementById('auto').addEventListener('click', function() {{
            load('?auto_window=true');
        }});
        document.getElementById('reset').addEventListener('click', function() {{
            load('?window_width=' + initial.width + '&window_center=' + initial.center);
        }});

        load('?window_width=' + initial.width + '&window_center=' + initial.center);
    </script>
</body>
</html>"##,
        escaped_path = escaped_path,
        patient_name = patient_name,
        patient_id = patient_id,
        study_date = study_date,
        series_description = series_description,
        modality = modality,
        width = output.width,
        height = output.height,
        range_min = output.range.min,
        range_max = output.range.max,
        width_max = width_max,
        center_min = center_min,
        center_max = center_max,
        window_width = output.window.width,
        window_center = output.window.center,
        image_url = image_url,
    )
}
