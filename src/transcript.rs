//! Canonical, domain-separated transcripts for Fiat-Shamir challenges.
//!
//! Every field is length-prefixed so that two different transcripts can never
//! encode to the same byte string.

use ark_ec::CurveGroup;
use ark_ff::PrimeField;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::types::VoterId;

const DOMAIN_TAG: &[u8] = b"blindvote/transcript/v1";

/// Builder for canonical proof transcripts.
pub struct TranscriptBuilder {
    buffer: Vec<u8>,
}

impl TranscriptBuilder {
    pub fn new(kind: &'static str) -> Self {
        let mut buffer = Vec::with_capacity(256);
        buffer.extend_from_slice(DOMAIN_TAG);
        buffer.extend_from_slice(&(kind.len() as u16).to_be_bytes());
        buffer.extend_from_slice(kind.as_bytes());
        Self { buffer }
    }

    pub fn append_bytes(&mut self, bytes: &[u8]) {
        self.buffer
            .extend_from_slice(&(bytes.len() as u32).to_be_bytes());
        self.buffer.extend_from_slice(bytes);
    }

    pub fn append_label(&mut self, label: &'static [u8]) {
        self.append_bytes(label);
    }

    pub fn append_curve_point<C: CurveGroup>(&mut self, point: &C) {
        let mut buf = Vec::new();
        point
            .serialize_compressed(&mut buf)
            .expect("curve serialization");
        self.append_bytes(&buf);
    }

    pub fn append<T: Transcribe + ?Sized>(&mut self, value: &T) {
        value.write_transcript(self);
    }

    pub fn finish(self) -> Vec<u8> {
        self.buffer
    }

    /// Hash the transcript with SHA-256 and reduce the digest into the scalar field.
    pub fn challenge<F: PrimeField>(self) -> F {
        let digest = Sha256::digest(&self.buffer);
        F::from_be_bytes_mod_order(&digest)
    }
}

/// Values with a canonical transcript encoding.
pub trait Transcribe {
    fn write_transcript(&self, builder: &mut TranscriptBuilder);
}

impl Transcribe for Uuid {
    fn write_transcript(&self, builder: &mut TranscriptBuilder) {
        builder.append_bytes(self.as_bytes());
    }
}

impl Transcribe for VoterId {
    fn write_transcript(&self, builder: &mut TranscriptBuilder) {
        builder.append_bytes(self.as_str().as_bytes());
    }
}

/// Binds a proof to one voter in one election.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProofContext {
    pub election_id: Uuid,
    pub voter_id: VoterId,
}

impl ProofContext {
    pub fn new(election_id: Uuid, voter_id: VoterId) -> Self {
        Self {
            election_id,
            voter_id,
        }
    }
}

impl Transcribe for ProofContext {
    fn write_transcript(&self, builder: &mut TranscriptBuilder) {
        builder.append_label(b"election");
        builder.append(&self.election_id);
        builder.append_label(b"voter");
        builder.append(&self.voter_id);
    }
}
