//! The prompt, read, validate, hash and emit loop.

use std::io::{self, Read, Write};

use tracing::{debug, info, trace};

use crypt_cleanup::{BufferSlot, GuardedBuffer, GuardedTerminal, SecurityContext};
use crypt_provider::{read_c_str, HashProvider, ProviderError};

use crate::config::SessionConfig;
use crate::entropy::EntropySource;
use crate::error::SessionError;
use crate::storage::{CryptStorage, Regions, ENTROPY_SIZE, SETTING_SIZE};

const PROMPT: &str = "Password: ";

/// Where passphrases come from. Chosen once at startup.
#[derive(Debug)]
pub enum InputMode<'ctx, R> {
    /// Controlling terminal: prompt and echo suppression.
    Interactive(GuardedTerminal<'ctx>),
    /// Non-terminal standard input: no prompt, no mode changes.
    Batch(R),
}

impl<R: Read> InputMode<'_, R> {
    fn read_byte_into(&mut self, dest: &mut u8) -> io::Result<bool> {
        match self {
            Self::Interactive(terminal) => terminal.read_byte_into(dest),
            Self::Batch(reader) => crypt_terminal::read_byte_into(reader, dest),
        }
    }
}

/// What one iteration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A hash line was written.
    Hashed,
    /// The passphrase contained a control character.
    Rejected,
    /// Empty line or end of input.
    Finished,
}

/// Counts reported when the session ends cleanly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Passphrases hashed.
    pub hashed: usize,
    /// Passphrases rejected.
    pub rejected: usize,
}

#[derive(Debug, Default)]
struct Line {
    len: usize,
    any_input: bool,
}

/// A hashing session over locked storage.
///
/// Both buffers are scrubbed between iterations and when [`run`] returns;
/// dropping the session restores the terminal and releases the memory.
///
/// [`run`]: Session::run
pub struct Session<'ctx, P, E, R, O, W> {
    config: SessionConfig,
    mode: InputMode<'ctx, R>,
    provider: P,
    entropy_source: E,
    storage: CryptStorage<'ctx>,
    entropy: GuardedBuffer<'ctx>,
    out: O,
    err: W,
}

impl<'ctx, P, E, R, O, W> Session<'ctx, P, E, R, O, W>
where
    P: HashProvider,
    E: EntropySource,
    R: Read,
    O: Write,
    W: Write,
{
    /// Validates the provider against the storage layout, then acquires and
    /// registers both locked buffers.
    pub fn new(
        config: SessionConfig,
        mode: InputMode<'ctx, R>,
        provider: P,
        entropy_source: E,
        context: &'ctx SecurityContext,
        out: O,
        err: W,
    ) -> Result<Self, SessionError> {
        let max_setting = provider.max_setting_len();
        if max_setting > SETTING_SIZE {
            return Err(SessionError::Config(format!(
                "provider settings need up to {} bytes but the setting region holds {}",
                max_setting, SETTING_SIZE
            )));
        }

        let storage = CryptStorage::acquire(context)?;
        let entropy = GuardedBuffer::acquire(context, BufferSlot::Entropy, ENTROPY_SIZE)?;

        debug!(
            prefix = config.prefix().unwrap_or("<default>"),
            rounds = config.rounds,
            interactive = matches!(mode, InputMode::Interactive(_)),
            "session ready"
        );

        Ok(Self {
            config,
            mode,
            provider,
            entropy_source,
            storage,
            entropy,
            out,
            err,
        })
    }

    /// Runs until an empty line, end of input or a fatal error.
    pub fn run(&mut self) -> Result<SessionSummary, SessionError> {
        let mut summary = SessionSummary::default();

        let result = loop {
            match self.step() {
                Ok(Step::Hashed) => summary.hashed += 1,
                Ok(Step::Rejected) => summary.rejected += 1,
                Ok(Step::Finished) => break Ok(summary),
                Err(e) => break Err(e),
            }
        };

        self.scrub();

        if let Ok(summary) = &result {
            info!(
                hashed = summary.hashed,
                rejected = summary.rejected,
                "session finished"
            );
        }
        result
    }

    /// Runs one iteration. Both buffers are zero again when it returns `Ok`.
    pub fn step(&mut self) -> Result<Step, SessionError> {
        self.refill()?;

        let line = self.read_passphrase()?;
        if line.len == 0 {
            trace!("no passphrase entered");
            return Ok(Step::Finished);
        }

        let step = match self.control_character(line.len) {
            Some(byte) => {
                writeln!(self.err, "error: control character 0x{:02x} in password", byte)?;
                self.err.flush()?;
                debug!("passphrase rejected");
                Step::Rejected
            }
            None => {
                self.hash_and_emit(line.len)?;
                Step::Hashed
            }
        };

        self.scrub();
        Ok(step)
    }

    fn scrub(&mut self) {
        self.storage.scrub();
        self.entropy.scrub();
    }

    fn refill(&mut self) -> Result<(), SessionError> {
        self.scrub();
        self.entropy_source.fill(self.entropy.as_mut_slice())?;
        trace!(len = ENTROPY_SIZE, "entropy refilled");
        Ok(())
    }

    fn read_passphrase(&mut self) -> Result<Line, SessionError> {
        if let InputMode::Interactive(terminal) = &mut self.mode {
            terminal.prompt(PROMPT)?;
            terminal.suppress_echo()?;
        }

        let read = read_line(&mut self.mode, self.storage.regions().input);

        if let InputMode::Interactive(terminal) = &mut self.mode {
            terminal.restore()?;
            if matches!(&read, Ok(line) if line.any_input) {
                terminal.newline()?;
            }
        }

        Ok(read?)
    }

    fn control_character(&mut self, len: usize) -> Option<u8> {
        self.storage.regions().input[..len]
            .iter()
            .copied()
            .find(|&b| b < 0x20)
    }

    fn hash_and_emit(&mut self, len: usize) -> Result<(), SessionError> {
        let Regions {
            input,
            setting,
            output,
        } = self.storage.regions();

        self.provider
            .generate_setting(
                self.config.prefix(),
                self.config.rounds,
                self.entropy.as_slice(),
                setting,
            )
            .map_err(|e| provider_failure(e, setting))?;

        let hash_len = self
            .provider
            .hash(&input[..len], setting, output)
            .map_err(|e| provider_failure(e, output))?;

        self.out.write_all(b"Hash: ")?;
        self.out.write_all(&output[..hash_len])?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

/// Reads one line straight into `input`, replacing the newline with NUL.
///
/// At most `input.len() - 1` bytes are taken; anything beyond stays in the
/// stream for the next read.
fn read_line<R: Read>(mode: &mut InputMode<'_, R>, input: &mut [u8]) -> io::Result<Line> {
    let capacity = input.len().saturating_sub(1);
    let mut line = Line::default();

    while line.len < capacity {
        let slot = &mut input[line.len];
        if !mode.read_byte_into(slot)? {
            break;
        }
        line.any_input = true;

        if *slot == b'\n' {
            *slot = 0;
            return Ok(line);
        }
        line.len += 1;
    }

    if line.len == capacity {
        debug!(capacity, "passphrase truncated");
    }
    if let Some(end) = input.get_mut(line.len) {
        *end = 0;
    }
    Ok(line)
}

fn provider_failure(error: ProviderError, region: &[u8]) -> SessionError {
    SessionError::Provider {
        diagnostic: String::from_utf8_lossy(read_c_str(region)).into_owned(),
        error,
    }
}
