// src/recipe/kitchen/driver.rs

//! Build-tool drivers

use crate::error::{Error, Result};
use crate::resolver::{BuildSystem, InvocationPlan};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Steps of an external build, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildPhase {
    PreConfigure,
    Configure,
    Build,
    Install,
}

impl BuildPhase {
    pub const ALL: [BuildPhase; 4] = [
        BuildPhase::PreConfigure,
        BuildPhase::Configure,
        BuildPhase::Build,
        BuildPhase::Install,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PreConfigure => "pre-configure",
            Self::Configure => "configure",
            Self::Build => "build",
            Self::Install => "install",
        }
    }
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a driver needs to run one phase
#[derive(Debug)]
pub struct BuildContext<'a> {
    pub plan: &'a InvocationPlan,
    /// Located build tool
    pub tool: &'a Path,
    pub source_dir: &'a Path,
    /// Out-of-tree build directory (meson only)
    pub build_dir: &'a Path,
    /// Install prefix
    pub prefix: &'a Path,
    /// Extra environment for every phase
    pub env: &'a [(String, String)],
    pub jobs: u32,
}

/// Runs the external build tool
pub trait BuildDriver: Send + Sync {
    /// Find the tool driving `system`; `ToolNotFoundError` when absent
    fn locate(&self, system: BuildSystem) -> Result<PathBuf>;

    /// Run one phase, returning its captured output
    fn run(&self, phase: BuildPhase, ctx: &BuildContext<'_>) -> Result<String>;
}

/// A command to run for a phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
}

/// Drives meson/ninja or configure/make as child processes
pub struct CommandDriver;

impl CommandDriver {
    /// Commands for a phase, in order
    pub fn commands(phase: BuildPhase, ctx: &BuildContext<'_>) -> Vec<PhaseCommand> {
        let prefix = format!("--prefix={}", ctx.prefix.display());
        let jobs = format!("-j{}", ctx.jobs.max(1));
        let build_dir = ctx.build_dir.display().to_string();

        let command = |program: PathBuf, args: Vec<String>, cwd: &Path| PhaseCommand {
            program,
            args,
            cwd: cwd.to_path_buf(),
            env: ctx.env.to_vec(),
        };

        match (ctx.plan.build_system, phase) {
            (_, BuildPhase::PreConfigure) => ctx
                .plan
                .pre_configure
                .iter()
                .filter_map(|argv| argv.split_first())
                .map(|(program, args)| command(PathBuf::from(program), args.to_vec(), ctx.source_dir))
                .collect(),

            (BuildSystem::Meson, BuildPhase::Configure) => {
                let mut args = vec![
                    "setup".to_string(),
                    build_dir,
                    ctx.source_dir.display().to_string(),
                    prefix,
                    "--libdir=lib".to_string(),
                    "--buildtype=release".to_string(),
                ];
                args.extend(ctx.plan.meson_args());
                vec![command(ctx.tool.to_path_buf(), args, ctx.source_dir)]
            }
            (BuildSystem::Meson, BuildPhase::Build) => vec![command(
                PathBuf::from("ninja"),
                vec!["-C".to_string(), build_dir, jobs],
                ctx.source_dir,
            )],
            (BuildSystem::Meson, BuildPhase::Install) => vec![command(
                PathBuf::from("ninja"),
                vec!["-C".to_string(), build_dir, "install".to_string()],
                ctx.source_dir,
            )],

            (BuildSystem::Autotools, BuildPhase::Configure) => {
                let mut args = vec![prefix];
                args.extend(ctx.plan.configure_args());
                let mut cmd = command(ctx.source_dir.join("configure"), args, ctx.source_dir);
                cmd.env.extend(ctx.plan.configure_env());
                vec![cmd]
            }
            (BuildSystem::Autotools, BuildPhase::Build) => {
                vec![command(PathBuf::from("make"), vec![jobs], ctx.source_dir)]
            }
            (BuildSystem::Autotools, BuildPhase::Install) => vec![command(
                PathBuf::from("make"),
                vec!["install".to_string()],
                ctx.source_dir,
            )],
        }
    }

    fn execute(phase: BuildPhase, cmd: &PhaseCommand) -> Result<String> {
        debug!("Command: {} {}", cmd.program.display(), cmd.args.join(" "));

        let output = Command::new(&cmd.program)
            .args(&cmd.args)
            .current_dir(&cmd.cwd)
            .envs(cmd.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .output()
            .map_err(|e| Error::BuildToolError {
                phase: phase.to_string(),
                code: None,
                output: format!("Failed to run {}: {}", cmd.program.display(), e),
            })?;

        let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
        log.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(Error::BuildToolError {
                phase: phase.to_string(),
                code: output.status.code(),
                output: log,
            });
        }
        Ok(log)
    }
}

impl BuildDriver for CommandDriver {
    fn locate(&self, system: BuildSystem) -> Result<PathBuf> {
        which::which(system.tool()).map_err(|_| Error::ToolNotFoundError {
            tool: system.tool().to_string(),
            requirement: system.tool_requirement().to_string(),
        })
    }

    fn run(&self, phase: BuildPhase, ctx: &BuildContext<'_>) -> Result<String> {
        let commands = Self::commands(phase, ctx);
        if commands.is_empty() {
            return Ok(String::new());
        }

        info!("Running {} phase", phase);
        let mut log = String::new();
        for cmd in &commands {
            log.push_str(&Self::execute(phase, cmd)?);
        }
        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Architecture, CompilerFamily, OperatingSystem, PlatformDescriptor};
    use crate::resolver::{RequestedOptions, Resolver, ResolverConfig};
    use semver::Version;

    fn plan(config: ResolverConfig) -> InvocationPlan {
        let desc = PlatformDescriptor::new(
            OperatingSystem::Linux,
            Architecture::X86_64,
            CompilerFamily::Gcc,
        );
        Resolver::new(config)
            .resolve(&desc, &RequestedOptions::new())
            .unwrap()
            .plan
    }

    fn ctx<'a>(plan: &'a InvocationPlan, env: &'a [(String, String)]) -> BuildContext<'a> {
        BuildContext {
            plan,
            tool: Path::new("/usr/bin/meson"),
            source_dir: Path::new("/work/src"),
            build_dir: Path::new("/work/build"),
            prefix: Path::new("/work/package"),
            env,
            jobs: 8,
        }
    }

    #[test]
    fn test_meson_commands() {
        let plan = plan(ResolverConfig::for_meson(&Version::new(0, 53, 2)));
        let env = vec![("PKG_CONFIG_PATH".to_string(), "/deps/zlib/lib/pkgconfig".to_string())];
        let ctx = ctx(&plan, &env);

        assert!(CommandDriver::commands(BuildPhase::PreConfigure, &ctx).is_empty());

        let configure = CommandDriver::commands(BuildPhase::Configure, &ctx);
        assert_eq!(configure.len(), 1);
        assert_eq!(configure[0].program, PathBuf::from("/usr/bin/meson"));
        assert_eq!(&configure[0].args[..3], &["setup", "/work/build", "/work/src"]);
        assert!(configure[0].args.contains(&"--prefix=/work/package".to_string()));
        assert!(configure[0].args.contains(&"-Dselinux=enabled".to_string()));
        assert_eq!(configure[0].env, env);

        let build = CommandDriver::commands(BuildPhase::Build, &ctx);
        assert_eq!(build[0].args, vec!["-C", "/work/build", "-j8"]);

        let install = CommandDriver::commands(BuildPhase::Install, &ctx);
        assert_eq!(install[0].args, vec!["-C", "/work/build", "install"]);
    }

    #[test]
    fn test_autotools_commands() {
        let plan = plan(ResolverConfig::for_autotools());
        let ctx = ctx(&plan, &[]);

        let pre = CommandDriver::commands(BuildPhase::PreConfigure, &ctx);
        assert_eq!(pre.len(), 1);
        assert_eq!(pre[0].program, PathBuf::from("autoreconf"));
        assert_eq!(pre[0].args, vec!["--force", "--install", "--verbose"]);

        let configure = CommandDriver::commands(BuildPhase::Configure, &ctx);
        assert_eq!(configure[0].program, PathBuf::from("/work/src/configure"));
        assert_eq!(configure[0].args[0], "--prefix=/work/package");
        assert!(configure[0].args.contains(&"--disable-shared".to_string()));
        assert!(configure[0]
            .env
            .contains(&("CFLAGS".to_string(), "-m64".to_string())));

        let build = CommandDriver::commands(BuildPhase::Build, &ctx);
        assert_eq!(build[0].program, PathBuf::from("make"));
        assert_eq!(build[0].args, vec!["-j8"]);
    }

    #[test]
    fn test_failing_command_reports_phase() {
        let cmd = PhaseCommand {
            program: PathBuf::from("sh"),
            args: vec!["-c".to_string(), "echo broken >&2; exit 3".to_string()],
            cwd: std::env::temp_dir(),
            env: Vec::new(),
        };
        let err = CommandDriver::execute(BuildPhase::Configure, &cmd).unwrap_err();
        match err {
            Error::BuildToolError {
                phase,
                code,
                output,
            } => {
                assert_eq!(phase, "configure");
                assert_eq!(code, Some(3));
                assert!(output.contains("broken"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_phase_order() {
        let names: Vec<&str> = BuildPhase::ALL.iter().map(|p| p.as_str()).collect();
        assert_eq!(names, vec!["pre-configure", "configure", "build", "install"]);
    }
}
