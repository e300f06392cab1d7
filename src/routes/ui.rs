use axum::{response::Html, routing::get, Router};

pub fn router() -> Router {
    Router::new().route("/", get(index))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>Data Insight Extractor</title>
  <style>
    body { font-family: Arial, sans-serif; margin: 2rem auto; max-width: 860px; color: #1d1d1f; }
    h1 { text-align: center; }
    .card { border: 1px solid #ddd; padding: 1rem; border-radius: 8px; margin-bottom: 1rem; }
    input[type=text] { width: 100%; padding: 0.5rem; box-sizing: border-box; }
    .buttons { display: flex; gap: 1rem; margin-top: 0.75rem; }
    button { color: white; background-color: #4CAF50; border: none; border-radius: 4px;
             font-size: 14px; padding: 10px 24px; cursor: pointer; }
    button:hover { background-color: #45a049; }
    button:disabled { opacity: 0.6; cursor: wait; }
    #clearBtn { background-color: #f44336; }
    #endBtn { background-color: #FF6347; }
    .user { font-weight: 600; margin-bottom: 0.25rem; }
    .bot { white-space: pre-wrap; margin-top: 0; padding-bottom: 0.75rem; border-bottom: 1px solid #eee; }
    .error { color: #b00020; }
    #askCard { display: none; }
    footer { text-align: center; margin-top: 50px; color: #666; }
  </style>
</head>
<body>
  <h1>Data Insight Extractor</h1>

  <div class="card">
    <label for="fileInput">Upload a PDF or TXT file</label>
    <input id="fileInput" type="file" accept=".pdf,.txt" />
    <p id="status"></p>
  </div>

  <div class="card" id="askCard">
    <label for="question">You:</label>
    <input id="question" type="text" />
    <div class="buttons">
      <button id="searchBtn">Search</button>
      <button id="clearBtn">Clear</button>
      <button id="endBtn">End Conversation</button>
    </div>
    <p id="error" class="error"></p>
    <h3>Chat History:</h3>
    <div id="history"></div>
  </div>

  <footer><p>&copy; Data Insight Extractor. All rights reserved.</p></footer>

  <script>
    let sessionId = null;
    const $ = (id) => document.getElementById(id);

    function render(view) {
      $('status').textContent = view.status;
      $('askCard').style.display = view.document ? 'block' : 'none';
      $('question').value = view.input_text;
      const history = $('history');
      history.replaceChildren();
      for (const turn of view.conversation) {
        const q = document.createElement('p');
        q.className = 'user';
        q.textContent = 'You: ' + turn.question;
        const a = document.createElement('p');
        a.className = 'bot';
        a.textContent = 'Bot: ' + turn.answer;
        history.append(q, a);
      }
    }

    async function call(method, path, body) {
      $('error').textContent = '';
      const options = { method };
      if (body instanceof FormData) {
        options.body = body;
      } else if (body !== undefined) {
        options.headers = { 'Content-Type': 'application/json' };
        options.body = JSON.stringify(body);
      }
      const res = await fetch(path, options);
      const json = await res.json();
      if (!res.ok) {
        const message = json?.error?.message || res.statusText;
        $('error').textContent = message;
        $('status').textContent = message;
        return null;
      }
      render(json);
      return json;
    }

    async function start() {
      const view = await call('POST', '/api/sessions');
      if (view) sessionId = view.session_id;
    }

    $('fileInput').addEventListener('change', async (event) => {
      const file = event.target.files[0];
      if (!file || !sessionId) return;
      const form = new FormData();
      form.append('file', file);
      $('status').textContent = 'Extracting text...';
      await call('POST', `/api/sessions/${sessionId}/document`, form);
    });

    $('searchBtn').addEventListener('click', async () => {
      const question = $('question').value;
      if (!question.trim()) return;
      $('searchBtn').disabled = true;
      $('searchBtn').textContent = 'Generating response...';
      try {
        await call('POST', `/api/sessions/${sessionId}/ask`, { question });
      } finally {
        $('searchBtn').disabled = false;
        $('searchBtn').textContent = 'Search';
      }
    });

    $('clearBtn').addEventListener('click', () =>
      call('POST', `/api/sessions/${sessionId}/clear`));

    $('endBtn').addEventListener('click', () =>
      call('POST', `/api/sessions/${sessionId}/end`));

    $('question').addEventListener('change', () =>
      call('PUT', `/api/sessions/${sessionId}/input`, { text: $('question').value }));

    window.addEventListener('pagehide', () => {
      if (sessionId) fetch(`/api/sessions/${sessionId}`, { method: 'DELETE', keepalive: true });
    });

    start();
  </script>
</body>
</html>"#;
