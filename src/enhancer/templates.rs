//! Instruction templates and the Web UI page for the Prompt Enhancer

use super::components::{EnhancementOptions, PromptComponents};

/// System-role message sent with every enhancement request
pub const SYSTEM_PROMPT: &str =
    "You are an expert prompt engineer who creates highly effective AI prompts.";

const INSTRUCTION_PREAMBLE: &str = "You are an expert prompt engineer. Your task is to take the basic prompt components below and transform them into a highly effective, structured prompt that will get better AI responses.";

const INSTRUCTION_CLOSING: &str = "Please return ONLY the enhanced prompt, ready to be used with an AI assistant. The enhanced prompt should be comprehensive but clear, and should significantly improve the quality of responses compared to the original components.";

/// One line of the "Enhancement Requirements" list
pub struct RequirementLine {
    pub text: &'static str,
    pub applies: fn(&EnhancementOptions) -> bool,
}

fn always(_: &EnhancementOptions) -> bool {
    true
}

fn wants_examples(options: &EnhancementOptions) -> bool {
    options.include_examples
}

fn wants_steps(options: &EnhancementOptions) -> bool {
    options.include_steps
}

/// Ordered requirement table; the response-length line is appended after these
pub const REQUIREMENT_LINES: &[RequirementLine] = &[
    RequirementLine {
        text: "Create a clear, structured prompt that combines all components effectively",
        applies: always,
    },
    RequirementLine {
        text: "Include specific formatting instructions for the AI's response",
        applies: always,
    },
    RequirementLine {
        text: "Add a requirement for the AI to clarify any assumptions before responding",
        applies: always,
    },
    RequirementLine {
        text: "Make the prompt more specific and actionable",
        applies: always,
    },
    RequirementLine {
        text: "Include relevant constraints and guidelines",
        applies: always,
    },
    RequirementLine {
        text: EXAMPLES_REQUIREMENT,
        applies: wants_examples,
    },
    RequirementLine {
        text: STEPS_REQUIREMENT,
        applies: wants_steps,
    },
];

pub const EXAMPLES_REQUIREMENT: &str = "Request examples in the response";
pub const STEPS_REQUIREMENT: &str = "Ask for a step-by-step approach";

/// Response-length requirement for the selected tier
pub fn response_length_requirement(options: &EnhancementOptions) -> String {
    format!(
        "Set expectations for a {} response",
        options.response_length.as_lowercase()
    )
}

/// Requirement lines that apply to `options`, in order, without numbering
pub fn requirement_lines(options: &EnhancementOptions) -> Vec<String> {
    let mut lines: Vec<String> = REQUIREMENT_LINES
        .iter()
        .filter(|line| (line.applies)(options))
        .map(|line| line.text.to_string())
        .collect();
    lines.push(response_length_requirement(options));
    lines
}

/// Build the user-role instruction.
/// User text is appended, not substituted, so placeholder-like content survives verbatim.
pub fn build_enhancement_prompt(
    components: &PromptComponents,
    options: &EnhancementOptions,
) -> String {
    let mut prompt = String::with_capacity(
        1024 + components.role.len() + components.context.len() + components.task.len(),
    );

    prompt.push_str(INSTRUCTION_PREAMBLE);
    prompt.push_str("\n\nOriginal Components:\n- Role: ");
    prompt.push_str(&components.role);
    prompt.push_str("\n- Context: ");
    prompt.push_str(&components.context);
    prompt.push_str("\n- Task: ");
    prompt.push_str(&components.task);
    prompt.push_str("\n\nEnhancement Requirements:\n");

    for (i, line) in requirement_lines(options).iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, line));
    }

    prompt.push('\n');
    prompt.push_str(INSTRUCTION_CLOSING);
    prompt
}

/// Web UI HTML template for the Prompt Enhancer
pub const ENHANCER_UI_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>AI Prompt Enhancer</title>
  <style>
    * {
      margin: 0;
      padding: 0;
      box-sizing: border-box;
    }

    body {
      font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Roboto', 'Helvetica Neue', sans-serif;
      background: #f5f5f5;
      min-height: 100vh;
      padding: 20px;
    }

    .container {
      background: white;
      border-radius: 8px;
      box-shadow: 0 2px 8px rgba(0, 0, 0, 0.1);
      border: 1px solid #e0e0e0;
      max-width: 1200px;
      margin: 0 auto;
      overflow: hidden;
    }

    .header {
      padding: 30px;
      text-align: center;
      border-bottom: 1px solid #e0e0e0;
    }

    .header h1 {
      font-size: 24px;
      font-weight: 600;
      margin-bottom: 8px;
      color: #333;
    }

    .header p {
      font-size: 14px;
      color: #666;
    }

    .config {
      padding: 20px 30px;
      border-bottom: 1px solid #e0e0e0;
      background: #fafafa;
    }

    .columns {
      display: grid;
      grid-template-columns: 1fr 1fr;
      gap: 30px;
      padding: 30px;
    }

    .section {
      margin-bottom: 20px;
    }

    .section-title {
      font-size: 14px;
      font-weight: 600;
      color: #333;
      margin-bottom: 10px;
      text-transform: uppercase;
      letter-spacing: 0.5px;
    }

    label {
      display: block;
      font-size: 13px;
      color: #555;
      margin-bottom: 6px;
    }

    .hint {
      font-size: 12px;
      color: #999;
      margin-top: 4px;
    }

    input[type="password"], select {
      width: 100%;
      padding: 10px 12px;
      border: 2px solid #e0e0e0;
      border-radius: 8px;
      font-size: 14px;
      background: white;
    }

    textarea {
      width: 100%;
      min-height: 110px;
      padding: 12px;
      border: 2px solid #e0e0e0;
      border-radius: 8px;
      font-family: inherit;
      font-size: 14px;
      line-height: 1.6;
      resize: vertical;
      transition: border-color 0.3s;
      background: #fafafa;
    }

    textarea:focus, input:focus, select:focus {
      outline: none;
      border-color: #333;
      background: white;
    }

    textarea[readonly] {
      min-height: 350px;
      font-family: 'SF Mono', 'Monaco', 'Menlo', 'Consolas', monospace;
    }

    .checkbox {
      display: flex;
      align-items: center;
      gap: 8px;
      font-size: 14px;
      color: #333;
      margin-bottom: 10px;
    }

    .checkbox input {
      width: 16px;
      height: 16px;
    }

    button {
      padding: 12px 28px;
      border: none;
      border-radius: 8px;
      font-size: 15px;
      font-weight: 600;
      cursor: pointer;
      transition: all 0.3s;
      display: inline-flex;
      align-items: center;
      gap: 8px;
    }

    .send-btn {
      background: #333;
      color: white;
    }

    .send-btn:hover:not(:disabled) {
      background: #000;
    }

    .send-btn:disabled {
      background: #ccc;
      cursor: not-allowed;
    }

    pre.copy-view {
      background: #f9f9f9;
      border-left: 4px solid #333;
      padding: 15px;
      border-radius: 4px;
      white-space: pre-wrap;
      word-break: break-word;
      font-size: 13px;
      max-height: 400px;
      overflow: auto;
    }

    .status {
      margin-top: 20px;
      padding: 15px;
      border-radius: 8px;
      display: none;
    }

    .status.success {
      background: #d4edda;
      color: #155724;
      border-left: 4px solid #28a745;
      display: block;
    }

    .status.error {
      background: #f8d7da;
      color: #721c24;
      border-left: 4px solid #dc3545;
      display: block;
    }

    .status.warning {
      background: #fff3cd;
      color: #856404;
      border-left: 4px solid #ffc107;
      display: block;
    }

    .status .guidance {
      margin-top: 6px;
      font-size: 13px;
    }

    .spinner {
      border: 2px solid #f3f3f3;
      border-top: 2px solid #333;
      border-radius: 50%;
      width: 16px;
      height: 16px;
      animation: spin 1s linear infinite;
    }

    @keyframes spin {
      0% { transform: rotate(0deg); }
      100% { transform: rotate(360deg); }
    }

    .footer {
      padding: 20px 30px 30px;
      border-top: 1px solid #e0e0e0;
      font-size: 14px;
      color: #555;
      line-height: 1.7;
    }

    .footer h3 {
      font-size: 15px;
      color: #333;
      margin: 12px 0 6px;
    }

    .footer ol, .footer ul {
      padding-left: 22px;
    }

    @media (max-width: 768px) {
      .columns {
        grid-template-columns: 1fr;
      }
    }
  </style>
</head>
<body>
  <div class="container">
    <div class="header">
      <h1>AI Prompt Enhancer</h1>
      <p>Transform your basic prompts into powerful, structured instructions that get better AI responses!</p>
    </div>

    <div class="config">
      <div class="section-title">Configuration</div>
      <label for="apiKey">Enter your OpenAI API Key:</label>
      <input type="password" id="apiKey" autocomplete="off" spellcheck="false">
      <div class="hint" id="apiKeyHint">Please enter your OpenAI API Key to use the app. Your API key will not be stored.</div>
    </div>

    <div class="columns">
      <div>
        <div class="section-title">Input Your Prompt Components</div>
        <div class="section">
          <label for="role">Role:</label>
          <textarea id="role" placeholder="e.g., You are an experienced marketing strategist..."></textarea>
          <div class="hint">Define who the AI should act as</div>
        </div>
        <div class="section">
          <label for="context">Context:</label>
          <textarea id="context" placeholder="e.g., I'm launching a new SaaS product for small businesses..."></textarea>
          <div class="hint">Provide background information and situation</div>
        </div>
        <div class="section">
          <label for="task">Task:</label>
          <textarea id="task" placeholder="e.g., Create a comprehensive marketing plan..."></textarea>
          <div class="hint">Specify exactly what you want the AI to do</div>
        </div>

        <div class="section-title">Enhancement Options</div>
        <div class="section">
          <label class="checkbox"><input type="checkbox" id="includeExamples" checked> Request examples in the response</label>
          <label class="checkbox"><input type="checkbox" id="includeSteps" checked> Ask for step-by-step breakdown</label>
          <label for="responseLength">Preferred response length:</label>
          <select id="responseLength">
            <option value="Concise" selected>Concise</option>
            <option value="Detailed">Detailed</option>
            <option value="Comprehensive">Comprehensive</option>
          </select>
        </div>
      </div>

      <div>
        <div class="section-title">Enhanced Prompt</div>
        <div class="section">
          <button class="send-btn" id="enhanceBtn" onclick="enhancePrompt()">Enhance Prompt</button>
        </div>
        <div id="status" class="status"></div>
        <div id="resultBlock" style="display: none;">
          <div class="section" style="margin-top: 20px;">
            <label for="result">Your Enhanced Prompt:</label>
            <textarea id="result" readonly spellcheck="false"></textarea>
            <div class="hint">Copy this enhanced prompt to use with any AI assistant</div>
          </div>
          <div class="section">
            <div class="section-title">Copy-Ready Format</div>
            <pre class="copy-view"><code id="copyView"></code></pre>
          </div>
        </div>
      </div>
    </div>

    <div class="footer">
      <h3>How to Use:</h3>
      <ol>
        <li><strong>Enter your OpenAI API Key</strong> at the top of the page</li>
        <li><strong>Fill in the Role</strong>: Define who the AI should act as (expert, assistant, etc.)</li>
        <li><strong>Provide Context</strong>: Give background information about your situation or project</li>
        <li><strong>Specify the Task</strong>: Clearly state what you want the AI to accomplish</li>
        <li><strong>Choose enhancement options</strong> to customize the output</li>
        <li><strong>Click "Enhance Prompt"</strong> to get your improved prompt</li>
        <li><strong>Copy the enhanced prompt</strong> and use it with any AI assistant</li>
      </ol>
      <h3>Tips:</h3>
      <ul>
        <li>Be specific in your role definition (include expertise level, background)</li>
        <li>Provide relevant context that helps the AI understand your situation</li>
        <li>Make your task clear and actionable</li>
        <li>The enhanced prompt will work with GPT, Claude, or other AI assistants</li>
      </ul>
      <h3>About API Usage:</h3>
      <ul>
        <li>Your API key is not stored and is only used for this session</li>
        <li>Each enhancement typically costs less than $0.01 in API credits</li>
        <li>You can get an API key from https://platform.openai.com/api-keys</li>
      </ul>
    </div>
  </div>

  <script>
    const urlParams = new URLSearchParams(window.location.search);
    let sessionId = urlParams.get('session');
    const enhanceBtn = document.getElementById('enhanceBtn');
    const apiKey = document.getElementById('apiKey');
    const apiKeyHint = document.getElementById('apiKeyHint');
    const POLL_INTERVAL_MS = 1000;
    let submitting = false;
    let pollTimer = null;

    apiKey.addEventListener('input', () => {
      apiKeyHint.textContent = apiKey.value
        ? 'API Key provided!'
        : 'Please enter your OpenAI API Key to use the app. Your API key will not be stored.';
    });

    // Render is a pure function of the session view returned by the server
    function render(view) {
      if (!view) return;
      document.getElementById('role').value = view.role;
      document.getElementById('context').value = view.context;
      document.getElementById('task').value = view.task;
      document.getElementById('includeExamples').checked = view.includeExamples;
      document.getElementById('includeSteps').checked = view.includeSteps;
      document.getElementById('responseLength').value = view.responseLength;

      enhanceBtn.disabled = view.busy;
      enhanceBtn.innerHTML = view.busy
        ? '<div class="spinner"></div> Enhancing your prompt...'
        : 'Enhance Prompt';

      const resultBlock = document.getElementById('resultBlock');
      if (view.result !== null && view.result !== undefined) {
        document.getElementById('result').value = view.result;
        document.getElementById('copyView').textContent = view.result;
        resultBlock.style.display = 'block';
      } else {
        resultBlock.style.display = 'none';
      }

      if (view.error) {
        showStatus(view.error.message, 'error', view.error.guidance);
      } else if (view.result !== null && view.result !== undefined) {
        showStatus('Prompt enhanced successfully! Copy the text above to use it.', 'success');
      } else {
        hideStatus();
      }

      schedulePoll(view);
    }

    // A request started before a reload is still running server-side; follow it
    function schedulePoll(view) {
      if (!view.busy || submitting || pollTimer) return;
      pollTimer = setTimeout(() => {
        pollTimer = null;
        fetch('/api/session?session=' + encodeURIComponent(sessionId))
          .then(r => r.json())
          .then(data => {
            if (data.view) {
              render(data.view);
            } else {
              sessionId = null;
              return ensureSession();
            }
          })
          .catch(() => schedulePoll(view));
      }, POLL_INTERVAL_MS);
    }

    function ensureSession() {
      if (sessionId) {
        return fetch('/api/session?session=' + encodeURIComponent(sessionId))
          .then(r => r.json())
          .then(data => {
            if (data.error) {
              sessionId = null;
              return ensureSession();
            }
            render(data.view);
            return sessionId;
          });
      }
      return fetch('/api/session', { method: 'POST' })
        .then(r => r.json())
        .then(data => {
          if (data.error) {
            throw new Error(data.error);
          }
          sessionId = data.sessionId;
          history.replaceState(null, '', '?session=' + encodeURIComponent(sessionId));
          render(data.view);
          return sessionId;
        });
    }

    function enhancePrompt() {
      if (enhanceBtn.disabled) return;

      submitting = true;
      enhanceBtn.disabled = true;
      enhanceBtn.innerHTML = '<div class="spinner"></div> Enhancing your prompt...';

      const body = {
        sessionId: sessionId,
        apiKey: apiKey.value,
        role: document.getElementById('role').value,
        context: document.getElementById('context').value,
        task: document.getElementById('task').value,
        includeExamples: document.getElementById('includeExamples').checked,
        includeSteps: document.getElementById('includeSteps').checked,
        responseLength: document.getElementById('responseLength').value
      };

      fetch('/api/submit', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify(body)
      })
      .then(r => r.json())
      .then(data => {
        submitting = false;
        if (data.view) {
          render(data.view);
        } else {
          enhanceBtn.disabled = false;
          enhanceBtn.innerHTML = 'Enhance Prompt';
          showStatus(data.error || 'Request failed', 'error', data.guidance);
        }
      })
      .catch(err => {
        submitting = false;
        enhanceBtn.disabled = false;
        enhanceBtn.innerHTML = 'Enhance Prompt';
        showStatus('Request failed: ' + err.message, 'error');
      });
    }

    function showStatus(message, type, guidance) {
      const status = document.getElementById('status');
      status.textContent = message;
      if (guidance) {
        const g = document.createElement('div');
        g.className = 'guidance';
        g.textContent = guidance;
        status.appendChild(g);
      }
      status.className = 'status ' + type;
    }

    function hideStatus() {
      const status = document.getElementById('status');
      status.textContent = '';
      status.className = 'status';
    }

    document.addEventListener('keydown', (e) => {
      if ((e.ctrlKey || e.metaKey) && e.key === 'Enter') {
        e.preventDefault();
        enhancePrompt();
      }
    });

    window.addEventListener('beforeunload', () => {
      if (sessionId) {
        navigator.sendBeacon('/api/end', JSON.stringify({ sessionId: sessionId }));
      }
    });

    enhanceBtn.disabled = true;
    ensureSession()
      .catch(err => showStatus('Load failed: ' + err.message, 'error'));
  </script>
</body>
</html>"#;
