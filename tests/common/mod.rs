//! Shared fixtures for the integration tests
//!
//! External tools are replaced by small shell scripts launched as
//! `sh <script>`, so the tests need neither potrace, vtracer nor rembg.

#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use svgforge::ServiceConfig;
use tempfile::TempDir;

/// Writes a stub SVG to the path following `--output` and logs its arguments
pub const FAKE_VTRACER: &str = r#"
echo "$@" > "$LOG_DIR/vtracer.args"
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    --output) out="$2"; shift 2 ;;
    *) shift ;;
  esac
done
printf '<svg xmlns="http://www.w3.org/2000/svg" data-tool="vtracer"></svg>' > "$out"
"#;

/// Keeps a copy of the bitmap it was given and writes a stub SVG to `-o`
pub const FAKE_POTRACE: &str = r#"
echo "$@" > "$LOG_DIR/potrace.args"
cp "$1" "$LOG_DIR/seen.bmp" || exit 3
printf '<svg xmlns="http://www.w3.org/2000/svg" data-tool="potrace"></svg>' > "$4"
"#;

/// Passes the image through unchanged
pub const FAKE_REMBG: &str = r#"
echo "$@" > "$LOG_DIR/rembg.args"
cat
"#;

/// Writes a truncated SVG to its output, then fails with a message on stderr
pub const FAILING_TOOL: &str = r#"
out=""
prev=""
for a in "$@"; do
  if [ "$prev" = "--output" ] || [ "$prev" = "-o" ]; then out="$a"; fi
  prev="$a"
done
[ -n "$out" ] && printf '<svg' > "$out"
echo "tracer exploded" >&2
exit 2
"#;

/// Succeeds without writing anything
pub const SILENT_TOOL: &str = "exit 0\n";

/// Temporary storage root plus a directory of fake tool scripts
pub struct Sandbox {
    pub dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("bin")).unwrap();
        std::fs::create_dir_all(dir.path().join("log")).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn storage_root(&self) -> PathBuf {
        self.dir.path().join("store")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.dir.path().join("log")
    }

    /// Write a script with `LOG_DIR` preset and return its command line
    pub fn script(&self, name: &str, body: &str) -> Vec<String> {
        let path = self.dir.path().join("bin").join(format!("{}.sh", name));
        let content = format!("LOG_DIR='{}'\n{}", self.log_dir().display(), body);
        std::fs::write(&path, content).unwrap();
        vec!["sh".to_string(), path.to_string_lossy().into_owned()]
    }

    /// Configuration with every tool replaced by a fake
    pub fn config(&self) -> ServiceConfig {
        self.config_with(FAKE_POTRACE, FAKE_VTRACER, FAKE_REMBG)
    }

    pub fn config_with(&self, potrace: &str, vtracer: &str, rembg: &str) -> ServiceConfig {
        ServiceConfig::builder()
            .storage_root(self.storage_root())
            .potrace_command(self.script("potrace", potrace))
            .vtracer_command(self.script("vtracer", vtracer))
            .rembg_command(self.script("rembg", rembg))
            .build()
            .unwrap()
    }

    pub fn logged_args(&self, tool: &str) -> String {
        std::fs::read_to_string(self.log_dir().join(format!("{}.args", tool)))
            .unwrap_or_default()
            .trim()
            .to_string()
    }

    pub fn count_files(&self, sub: &str) -> usize {
        std::fs::read_dir(self.storage_root().join(sub))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

pub fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buffer = Vec::new();
    image.write_to(&mut Cursor::new(&mut buffer), format).unwrap();
    buffer
}

/// Opaque red square as PNG bytes
pub fn red_png(size: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(size, size, Rgb([255, 0, 0])));
    encode(&img, ImageFormat::Png)
}

/// Black square on a transparent background, left half transparent
pub fn half_transparent_png() -> Vec<u8> {
    let img = RgbaImage::from_fn(8, 4, |x, _| {
        if x < 4 {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([0, 0, 0, 255])
        }
    });
    encode(&DynamicImage::ImageRgba8(img), ImageFormat::Png)
}
