//! Page bridge injected into the kick.com webview.
//!
//! The system webview has no native hook for observing remote https traffic,
//! so the bridge wraps `fetch` and `XMLHttpRequest` in the page's main world
//! and reports every request and title change over IPC. It never blocks or
//! rewrites a request; all matching happens in [`crate::session`].

pub(crate) const TITLE_CHANGED_COMMAND: &str = "kick_title_changed";
pub(crate) const REQUEST_OBSERVED_COMMAND: &str = "kick_request_observed";

const PAGE_BRIDGE_TEMPLATE: &str = r#"(function () {
  if (window !== window.top) return;
  if (window.__kickAppBridge) return;
  window.__kickAppBridge = true;

  function send(command, args) {
    var ipc = window.__TAURI_INTERNALS__;
    if (!ipc || typeof ipc.invoke !== 'function') return;
    try {
      ipc.invoke(command, args).catch(function () {});
    } catch (e) {}
  }

  function absolute(url) {
    try {
      return new URL(String(url), window.location.href).href;
    } catch (e) {
      return String(url);
    }
  }

  function report(method, url) {
    send('__REQUEST_COMMAND__', {
      method: String(method || 'GET').toUpperCase(),
      url: absolute(url)
    });
  }

  var originalFetch = window.fetch;
  if (typeof originalFetch === 'function') {
    window.fetch = function (input, init) {
      try {
        var isRequest = typeof Request !== 'undefined' && input instanceof Request;
        var method = (init && init.method) || (isRequest ? input.method : 'GET');
        report(method, isRequest ? input.url : input);
      } catch (e) {}
      return originalFetch.apply(this, arguments);
    };
  }

  var originalOpen = XMLHttpRequest.prototype.open;
  var originalSend = XMLHttpRequest.prototype.send;
  XMLHttpRequest.prototype.open = function (method, url) {
    this.__kickAppRequest = [method, url];
    return originalOpen.apply(this, arguments);
  };
  XMLHttpRequest.prototype.send = function () {
    try {
      if (this.__kickAppRequest) report(this.__kickAppRequest[0], this.__kickAppRequest[1]);
    } catch (e) {}
    return originalSend.apply(this, arguments);
  };

  var lastTitle = null;
  function checkTitle() {
    var title = document.title;
    if (title === lastTitle) return;
    lastTitle = title;
    send('__TITLE_COMMAND__', { title: title });
  }

  function watchTitle() {
    checkTitle();
    new MutationObserver(checkTitle).observe(document.documentElement, {
      subtree: true,
      childList: true,
      characterData: true
    });
  }

  if (document.documentElement) {
    watchTitle();
  } else {
    document.addEventListener('DOMContentLoaded', watchTitle);
  }
})();
"#;

pub(crate) fn page_bridge_script() -> String {
    PAGE_BRIDGE_TEMPLATE
        .replace("__REQUEST_COMMAND__", REQUEST_OBSERVED_COMMAND)
        .replace("__TITLE_COMMAND__", TITLE_CHANGED_COMMAND)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_targets_registered_commands() {
        let script = page_bridge_script();
        assert!(script.contains("'kick_request_observed'"));
        assert!(script.contains("'kick_title_changed'"));
        assert!(!script.contains("__REQUEST_COMMAND__"));
        assert!(!script.contains("__TITLE_COMMAND__"));
    }

    #[test]
    fn script_forwards_original_calls() {
        let script = page_bridge_script();
        assert!(script.contains("originalFetch.apply(this, arguments)"));
        assert!(script.contains("originalSend.apply(this, arguments)"));
    }
}
