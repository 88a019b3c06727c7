//! Upload form served at `/`.

use axum::response::Html;

const UPLOAD_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Identity Document Check</title>
  <style>
    body { font-family: Arial, sans-serif; max-width: 640px; margin: 40px auto; color: #333; }
    form { border: 1px solid #ddd; padding: 20px; border-radius: 6px; }
    pre { background: #f8f9fa; padding: 12px; white-space: pre-wrap; }
    .legitimate { color: #155724; } .fraud_suspected { color: #721c24; }
  </style>
</head>
<body>
  <h1>Identity Document Check</h1>
  <form id="upload" enctype="multipart/form-data">
    <input type="file" name="file" accept="image/*" required>
    <button type="submit">Check document</button>
  </form>
  <h2 id="status"></h2>
  <pre id="result"></pre>
  <script>
    document.getElementById('upload').addEventListener('submit', async (e) => {
      e.preventDefault();
      const status = document.getElementById('status');
      status.textContent = 'Checking...';
      status.className = '';
      const res = await fetch('/upload', { method: 'POST', body: new FormData(e.target) });
      const body = await res.json();
      status.textContent = body.status ? body.status + ': ' + body.message : body.error;
      status.className = body.status || '';
      document.getElementById('result').textContent = JSON.stringify(body, null, 2);
    });
  </script>
</body>
</html>
"#;

/// Handler for `GET /`.
pub async fn index() -> Html<&'static str> {
    Html(UPLOAD_PAGE)
}
