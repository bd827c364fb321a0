use std::process::Command;

fn main() {
  embed_build_info();
  set_rerun_conditions();
}

fn embed_build_info() {
  // Short commit hash, shown by `--version`; "unknown" outside a git checkout.
  let git_hash = git_output(&["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "unknown".to_string());
  println!("cargo:rustc-env=AUTOCOPYRIGHT_GIT_HASH={git_hash}");

  // Commit date in YYYY-MM-DD format.
  let git_date = git_output(&["log", "-1", "--format=%cs"]).unwrap_or_else(|| "unknown".to_string());
  println!("cargo:rustc-env=AUTOCOPYRIGHT_GIT_DATE={git_date}");
}

fn git_output(args: &[&str]) -> Option<String> {
  let output = Command::new("git").args(args).output().ok()?;
  if !output.status.success() {
    return None;
  }
  let text = String::from_utf8(output.stdout).ok()?.trim().to_string();
  if text.is_empty() { None } else { Some(text) }
}

fn set_rerun_conditions() {
  println!("cargo:rerun-if-changed=build.rs");
  println!("cargo:rerun-if-changed=.git/HEAD");
}
