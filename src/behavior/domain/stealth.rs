//! Browser fingerprint masking.

use rand::Rng;
use rand::seq::SliceRandom;

/// Desktop user agents paired with the `navigator.platform` they imply.
const DESKTOP_AGENTS: [(&str, &str); 4] = [
    (
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
        "Win32",
    ),
    (
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
        "Win32",
    ),
    (
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
        "MacIntel",
    ),
    (
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
        "Linux x86_64",
    ),
];

/// Core counts reported as `navigator.hardwareConcurrency`.
const CORE_COUNTS: [u8; 5] = [4, 6, 8, 12, 16];

/// Fingerprint presented to pages before any navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StealthProfile {
    /// `User-Agent` header and `navigator.userAgent`.
    pub user_agent: String,
    /// `navigator.platform`.
    pub platform: String,
    /// `navigator.languages`.
    pub languages: Vec<String>,
    /// `navigator.hardwareConcurrency`, between 4 and 16.
    pub hardware_concurrency: u8,
    /// `navigator.deviceMemory` in GiB.
    pub device_memory_gb: u8,
    /// Length of `navigator.plugins`.
    pub plugin_count: u8,
    /// Unmasked WebGL vendor.
    pub webgl_vendor: String,
    /// Unmasked WebGL renderer.
    pub webgl_renderer: String,
    /// Chance, in thousandths, that a canvas readback pixel is perturbed.
    pub canvas_noise_per_mille: u16,
}

impl StealthProfile {
    /// Samples a profile with a random desktop agent and core count.
    pub fn randomized<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let (user_agent, platform) = DESKTOP_AGENTS
            .choose(rng)
            .copied()
            .unwrap_or(DESKTOP_AGENTS[0]);
        let hardware_concurrency = CORE_COUNTS.choose(rng).copied().unwrap_or(8);
        Self {
            user_agent: user_agent.to_owned(),
            platform: platform.to_owned(),
            languages: vec!["en-US".to_owned(), "en".to_owned()],
            hardware_concurrency,
            device_memory_gb: 8,
            plugin_count: 5,
            webgl_vendor: "Intel Inc.".to_owned(),
            webgl_renderer: "Intel Iris OpenGL Engine".to_owned(),
            canvas_noise_per_mille: 10,
        }
    }

    /// Returns the script injected before any page script runs.
    ///
    /// It hides the automation flag, fakes plugins, languages, hardware, and
    /// platform, answers notification permission queries consistently, adds
    /// sparse ±1 noise to canvas readbacks, and pins the WebGL vendor and
    /// renderer.
    #[must_use]
    pub fn init_script(&self) -> String {
        let languages = js_string_array(&self.languages);
        let platform = js_string(&self.platform);
        let vendor = js_string(&self.webgl_vendor);
        let renderer = js_string(&self.webgl_renderer);
        format!(
            r"(() => {{
  const define = (target, key, value) =>
    Object.defineProperty(target, key, {{ get: () => value, configurable: true }});
  define(Navigator.prototype, 'webdriver', undefined);
  define(Navigator.prototype, 'languages', Object.freeze({languages}));
  define(Navigator.prototype, 'hardwareConcurrency', {cores});
  define(Navigator.prototype, 'deviceMemory', {memory});
  define(Navigator.prototype, 'platform', {platform});
  const fakePlugins = Array.from({{ length: {plugins} }}, (_, i) => ({{
    name: 'Plugin ' + i, filename: 'plugin' + i + '.so', description: '', length: 0
  }}));
  define(Navigator.prototype, 'plugins', fakePlugins);
  window.chrome = window.chrome || {{ runtime: {{}} }};
  const originalQuery = window.navigator.permissions && window.navigator.permissions.query;
  if (originalQuery) {{
    window.navigator.permissions.query = (parameters) =>
      parameters && parameters.name === 'notifications'
        ? Promise.resolve({{ state: Notification.permission }})
        : originalQuery.call(window.navigator.permissions, parameters);
  }}
  const noise = (data) => {{
    for (let i = 0; i < data.length; i += 4) {{
      if (Math.random() * 1000 < {noise}) {{
        for (let c = 0; c < 3; c++) {{
          data[i + c] = Math.max(0, Math.min(255, data[i + c] + (Math.random() < 0.5 ? -1 : 1)));
        }}
      }}
    }}
  }};
  const getImageData = CanvasRenderingContext2D.prototype.getImageData;
  CanvasRenderingContext2D.prototype.getImageData = function (...args) {{
    const image = getImageData.apply(this, args);
    noise(image.data);
    return image;
  }};
  const toDataURL = HTMLCanvasElement.prototype.toDataURL;
  HTMLCanvasElement.prototype.toDataURL = function (...args) {{
    const context = this.getContext('2d');
    if (context && this.width && this.height) {{
      const image = getImageData.call(context, 0, 0, this.width, this.height);
      noise(image.data);
      context.putImageData(image, 0, 0);
    }}
    return toDataURL.apply(this, args);
  }};
  for (const proto of [WebGLRenderingContext.prototype, window.WebGL2RenderingContext && WebGL2RenderingContext.prototype]) {{
    if (!proto) continue;
    const getParameter = proto.getParameter;
    proto.getParameter = function (parameter) {{
      if (parameter === 37445) return {vendor};
      if (parameter === 37446) return {renderer};
      return getParameter.call(this, parameter);
    }};
  }}
}})();",
            cores = self.hardware_concurrency,
            memory = self.device_memory_gb,
            plugins = self.plugin_count,
            noise = self.canvas_noise_per_mille,
        )
    }

    /// Returns the headers sent with every request.
    #[must_use]
    pub fn extra_headers(&self) -> Vec<(String, String)> {
        let accept_language = self
            .languages
            .iter()
            .enumerate()
            .map(|(index, language)| match index {
                0 => language.clone(),
                1 => format!("{language};q=0.9"),
                _ => format!("{language};q=0.8"),
            })
            .collect::<Vec<_>>()
            .join(",");
        vec![
            ("User-Agent".to_owned(), self.user_agent.clone()),
            (
                "Accept".to_owned(),
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8"
                    .to_owned(),
            ),
            ("Accept-Language".to_owned(), accept_language),
            ("Accept-Encoding".to_owned(), "gzip, deflate, br".to_owned()),
        ]
    }
}

fn js_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

fn js_string_array(values: &[String]) -> String {
    serde_json::Value::from(values.to_vec()).to_string()
}
