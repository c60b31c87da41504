//! Tests the agent client and the key generation orchestration
//! against a mock agent.
//!
//! The mock implements the line protocol over an in-memory stream
//! and holds real private keys, so the generated key blocks carry
//! cryptographically valid self signatures and verify end to end.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io::{Read, Write};
use std::rc::Rc;

use madrone_openpgp::cert::Cert;
use madrone_openpgp::crypto::mpi::{self, MPI};
use madrone_openpgp::crypto::sexp::{self, Sexp};
use madrone_openpgp::policy::StandardPolicy;
use madrone_openpgp::types::SignatureType;

use madrone_ipc::agent::Agent;
use madrone_ipc::keygen::{self, KeyParameters};
use madrone_ipc::status::StatusWriter;
use madrone_ipc::Error;

// A fixed RSA-2048 key pair (and a second one, so that a primary
// and its subkey differ).
const RSA_N: &str = "B4628492B5EBC4C4B3DAD4AE3650D95EAAFECB537AA75F39833A1BCCEC0111E663189C492E05055BD7770A6538453B581F7611938C0E47E76F5D32F8F09B515D34637F309C7FBBB5C271FAF983BB7FF3672BF5C63377CF99912BDED7F3E1B40BE9ED92555E78DE85EBC256AABD9485D55232AD9F133ABABE1A44B9F1917150B694CC577C12DB052632DCF66F813B1C032BC678E7FFFB9330BD3BA1AC6124AAB40DC8A6DD6D712E70787B6E0120EA080354C8638C9186599CDE47C6D0E7608E4518AAE07CA363275423C91025750D403C4B450406AD7873C832EED92080F962CAF618CBD864596448A0C09F7B166DEC20E04D832F95319EE3DBE5C5160783C38B";
const RSA_D: &str = "3E584A8FD6769D748AE1185EFA00E99011B3AC9CB6A8C07DC54041398B5C374E94737E18C0E2155F0FD261F268076DA26085533FD6C95CCABDAFCD9D42B3BBE465E5F9A0D886415F69CC313D29ED952490451E561995D057B8581C5631419214080F0763A01A5076A2EC713DE3F64067615888AF915ADC0E365008A0586F7CC0799024E6A4895F997141D8AF362A18723112958A1FA69429BBC2FFF37C7C60A151857302B3C15E70CC356F62C93101C60B6BBFBF99C6C658A8DBB7DDFEF5E97C9AACC5652739878800F2407BF1BD435CB494F1BA9272D50A345171AA0B1ED7C33AE5EEE7C9210155CDD29C3F2B137D81CF9B3457AA8B37FE2AE68E695A03C769";
const RSA_P: &str = "D9E3B0DEA5B59900B94D591ECE6B637E34DD1488C14855260567ACB728FFB1DF099886DBAEFAE43D927B8CD96A4EEDDE36B7FB6560B60F2E6ADEE25D340B867C2D6F2FE75FC8F039003CB984A4DBA2AC5EF5A0E3B99C0683B20B210A3A8C7796E09EDFB1104D513E8888B949C4BE11609C284091B4C30FFBCBC8A7F3D681DB8F";
const RSA_Q: &str = "D3EF81807742DFAD42023D4551B3A6B44D6B4FE855CDFF01EA2B75AB897F4BB386EB871140BD15398C4558832693906B49F68EB33450201F984E675D8CF975060104DFE7B4635030B576EA973FD2144162F917F05FDB92DB7E4299571AFB6D159B3E79FEFAE37BE0D73D275F95E5DF022A9D43C2793F1E3304BF425165100A45";

const RSA2_N: &str = "B6C8B9A9343F5289699990FF1A828B303549D0ABEA3EE230EAA536104468869AD24B3DFD27A2B13E399D3D60374038D561D6DA3C2912397A866FBD84EBE9C06F449C27F3D6F0A07B24889A290E9C143934AA46875CF7DFB2B0973DC96BF58ACF5E83A58DD1BF2D3CD25B377FF51C2E9E490FBE2C7AFBE11F4815FA99A8F5F19D6CC63EC1F6D7036CB6018A844B23B2DAF7CB4529A67017DB5AA1439E62E90646745F32AD6C40B5408E7C81090D15B70E6754F67A2E8279B61973BBDCA19D9F75AF5308C8428FC11296F69C17088459D143949128775586D9CA88F1917ABE21CDF7C10F70058625962F148D76E7622B794ED5A3D6B88A49BDE59E8B120A33EF09";
const RSA2_D: &str = "401555CA75EFF17F0DCFF25F0E2B50A3613B74F6A114D4F6B37DA2DBC73022692B6B87DB36C73A7F0772126FA64F54DDB304C1D4AFCD9CEB5130E1F03549E9D6D8E62AB7B9D6F95CD32D356749A0FD12255DC18679D8C9CBFB4FBB30E031E12DDD0428C9F50CA2CE9D2DAFE2A3CBF2A83A1353E88261C6C6D1DE2AD32EC2B3A796CC9A490F8A753827C3D33AD459833ECBB89EEBDF6F1C2EA992198F65F61899B77E1B35B9329DC680E064C5BBEBA128692BAF8A733800F18CA94E40D31AEB3876078998EB904E872B7EDC012C9AEC4994333420561A483031D7BD88203E0DED42039AF235AC47C4EC2617220F6A2FA3425F9DFAE83EDBA9A630EF1360980281";
const RSA2_P: &str = "C9D558503212E154A22A055709504D9672015CDF0C428F5F5E0B44AD6794D0A6D3A84BE9FC86107750B1AE9F5BC2F64A3B7F12361BF4B2832B18C9452C236D3C41AF664FF36C2B542EDC90684C61B5E30D6A3F4AC5085A75F3E85B908DA59128909F9A24919310B1F7B044DF4B3DC9FB9353604B9A262004D00F62F16941CD19";
const RSA2_Q: &str = "E7D6A09CDDBD62518333C01059740737DAE227CAFB910AF742835AC3C095C5797A5DFBDB381B465EFCF034B0F80059598813573648297AD6EDA7AB626612466B765A17DFF23FC882B890DD6EF9DBCAD1F6566FD1D6DC791DE14D387304B6CE94225264763DA6B3802D54ABCB8E9759A47B947165752A1AF18FFFA6782ED17F71";

const UNKNOWN_CMD: u32 = (4 << 24) | 275;
const NO_SECKEY: u32 = (4 << 24) | 17;
const CANCELED: u32 = (4 << 24) | 99;

fn hex_decode(s: &str) -> Vec<u8> {
    (0..s.len()).step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).unwrap())
        .collect()
}

enum MockKey {
    Rsa(rsa::RsaPrivateKey),
    Ed25519(ed25519_dalek::SigningKey),
    Ecdh,
}

enum Pending {
    Genkey(Vec<u8>),
    Ciphertext(Vec<u8>),
}

#[derive(Default)]
struct State {
    keys: HashMap<String, MockKey>,
    selected: Option<String>,
    digest: Option<(u8, Vec<u8>)>,
    genkey_lines: Vec<String>,
    rsa_count: usize,
    ed_seed: u8,
    fail_genkey: bool,
    answer_agent_id: bool,
}

/// An in-memory agent.  Commands are processed as the write side
/// sees a complete line; the responses are queued for the read
/// side.
struct MockAgent {
    state: Rc<RefCell<State>>,
    inbuf: Vec<u8>,
    outbuf: VecDeque<u8>,
    pending: Option<Pending>,
}

impl MockAgent {
    fn new() -> (Self, Rc<RefCell<State>>) {
        let state = Rc::new(RefCell::new(State::default()));
        let mut mock = MockAgent {
            state: state.clone(),
            inbuf: Vec::new(),
            outbuf: VecDeque::new(),
            pending: None,
        };
        mock.reply("OK Pleased to meet you");
        (mock, state)
    }

    fn reply(&mut self, line: &str) {
        self.outbuf.extend(line.as_bytes());
        self.outbuf.push_back(b'\n');
    }

    fn reply_err(&mut self, composite: u32, text: &str) {
        self.reply(&format!("ERR {} {}", composite, text));
    }

    fn reply_data(&mut self, data: &[u8]) {
        for chunk in data.chunks(200) {
            self.reply(&format!(
                "D {}", madrone_ipc::assuan::escape(chunk)));
        }
    }

    fn register(&mut self, mpis: &mpi::PublicKey, key: MockKey) {
        let grip = sexp::keygrip(mpis).unwrap().to_string();
        self.state.borrow_mut().keys.insert(grip, key);
    }

    fn process_line(&mut self, line: String) {
        let line = line.trim_end().to_string();

        // An inquiry in progress?
        if let Some(pending) = self.pending.take() {
            let (mut collected, is_genkey) = match pending {
                Pending::Genkey(c) => (c, true),
                Pending::Ciphertext(c) => (c, false),
            };
            if let Some(data) = line.strip_prefix("D ") {
                collected.extend(
                    madrone_ipc::assuan::unescape(data).unwrap());
                self.pending = Some(if is_genkey {
                    Pending::Genkey(collected)
                } else {
                    Pending::Ciphertext(collected)
                });
            } else if line == "END" {
                if is_genkey {
                    self.finish_genkey(&collected);
                } else {
                    self.finish_decrypt(&collected);
                }
            } else {
                self.reply_err(CANCELED, "IPC call has been cancelled");
            }
            return;
        }

        let (verb, rest) = match line.find(' ') {
            Some(pos) => (&line[..pos], &line[pos + 1..]),
            None => (&line[..], ""),
        };

        match verb {
            "GETINFO" => {
                self.reply("D 2.1.6");
                self.reply("OK");
            },
            "AGENT_ID" => {
                if self.state.borrow().answer_agent_id {
                    self.reply("OK keyring-daemon");
                } else {
                    self.reply_err(UNKNOWN_CMD, "Unknown IPC command");
                }
            },
            "OPTION" | "RESET" | "SETKEYDESC" => self.reply("OK"),
            "HAVEKEY" => {
                let state = self.state.borrow();
                if rest.split_whitespace()
                    .any(|g| state.keys.contains_key(g))
                {
                    drop(state);
                    self.reply("OK");
                } else {
                    drop(state);
                    self.reply_err(NO_SECKEY, "No secret key");
                }
            },
            "KEYINFO" => {
                if self.state.borrow().keys.contains_key(rest) {
                    self.reply(&format!(
                        "S KEYINFO {} D - - - P - - -", rest));
                    self.reply("OK");
                } else {
                    self.reply_err(NO_SECKEY, "No secret key");
                }
            },
            "GENKEY" => {
                self.state.borrow_mut().genkey_lines.push(line.clone());
                if self.state.borrow().fail_genkey {
                    self.reply_err(CANCELED, "Operation cancelled");
                } else {
                    self.pending = Some(Pending::Genkey(Vec::new()));
                    self.reply("INQUIRE KEYPARAM");
                }
            },
            "SIGKEY" | "SETKEY" => {
                if self.state.borrow().keys.contains_key(rest) {
                    self.state.borrow_mut().selected =
                        Some(rest.to_string());
                    self.reply("OK");
                } else {
                    self.reply_err(NO_SECKEY, "No secret key");
                }
            },
            "SETHASH" => {
                let mut it = rest.split_whitespace();
                let algo: u8 = it.next().unwrap().parse().unwrap();
                let digest = hex_decode(it.next().unwrap());
                self.state.borrow_mut().digest = Some((algo, digest));
                self.reply("OK");
            },
            "PKSIGN" => self.do_sign(),
            "PKDECRYPT" => {
                self.pending = Some(Pending::Ciphertext(Vec::new()));
                self.reply("INQUIRE CIPHERTEXT");
            },
            _ => self.reply_err(UNKNOWN_CMD, "Unknown IPC command"),
        }
    }

    fn finish_genkey(&mut self, keyparam: &[u8]) {
        let sexp = Sexp::from_bytes(keyparam).unwrap();
        let genkey = sexp.list().unwrap();
        assert_eq!(genkey[0].string(), Some(&b"genkey"[..]));
        let spec = genkey[1].list().unwrap();

        let (mpis, key) = match spec[0].string().unwrap() {
            b"rsa" => {
                let (n, d, p, q) = {
                    let s = self.state.borrow();
                    if s.rsa_count == 0 {
                        (RSA_N, RSA_D, RSA_P, RSA_Q)
                    } else {
                        (RSA2_N, RSA2_D, RSA2_P, RSA2_Q)
                    }
                };
                self.state.borrow_mut().rsa_count += 1;

                let to_big = |s: &str|
                    rsa::BigUint::parse_bytes(s.as_bytes(), 16).unwrap();
                let private = rsa::RsaPrivateKey::from_components(
                    to_big(n),
                    rsa::BigUint::from(65537u32),
                    to_big(d),
                    vec![to_big(p), to_big(q)]).unwrap();

                let mpis = mpi::PublicKey::RSA {
                    n: MPI::new(&hex_decode(n)),
                    e: MPI::new(&[1, 0, 1]),
                };
                (mpis, MockKey::Rsa(private))
            },
            b"ecc" => {
                let curve = genkey[1].lookup_value("curve").unwrap();
                let eddsa = genkey[1].lookup("flags")
                    .and_then(Sexp::list)
                    .map(|f| f[1..].iter()
                         .any(|x| x.string() == Some(b"eddsa")))
                    .unwrap_or(false);

                if eddsa {
                    assert_eq!(curve, &b"Ed25519"[..]);
                    let seed = {
                        let mut s = self.state.borrow_mut();
                        s.ed_seed += 1;
                        s.ed_seed
                    };
                    let secret = ed25519_dalek::SigningKey::from_bytes(
                        &[seed; 32]);
                    let mut point = vec![0x40];
                    point.extend_from_slice(
                        &secret.verifying_key().to_bytes());
                    let mpis = mpi::PublicKey::EdDSA {
                        curve: madrone_openpgp::types::Curve::Ed25519,
                        q: MPI::new_opaque(&point),
                    };
                    (mpis, MockKey::Ed25519(secret))
                } else {
                    assert_eq!(curve, &b"Curve25519"[..]);
                    let mut point = vec![0x40];
                    point.extend_from_slice(&[0x33; 32]);
                    let mpis = mpi::PublicKey::ECDH {
                        curve: madrone_openpgp::types::Curve::Cv25519,
                        q: MPI::new_opaque(&point),
                        hash: madrone_openpgp::types::HashAlgorithm::SHA256,
                        sym: madrone_openpgp::types
                            ::SymmetricAlgorithm::AES128,
                    };
                    (mpis, MockKey::Ecdh)
                }
            },
            other => panic!("mock cannot generate {:?}",
                            String::from_utf8_lossy(other)),
        };

        self.register(&mpis, key);

        // The reply mirrors what the client sent us, as a
        // public-key expression.
        let reply = public_key_sexp(&mpis);
        self.reply("S CACHE_NONCE 4E6F6E6365");
        self.reply("S KEY-CREATED-AT 1600010000");
        self.reply_data(&reply.to_vec());
        self.reply("OK");
    }

    fn do_sign(&mut self) {
        let state = self.state.borrow();
        let grip = state.selected.clone().expect("SIGKEY first");
        let (algo, digest) = state.digest.clone().expect("SETHASH first");
        let sig = match state.keys.get(&grip).expect("key exists") {
            MockKey::Rsa(private) => {
                let scheme = match algo {
                    2 => rsa::Pkcs1v15Sign
                        ::new::<sha1collisiondetection::Sha1CD>(),
                    8 => rsa::Pkcs1v15Sign::new::<sha2::Sha256>(),
                    9 => rsa::Pkcs1v15Sign::new::<sha2::Sha384>(),
                    10 => rsa::Pkcs1v15Sign::new::<sha2::Sha512>(),
                    11 => rsa::Pkcs1v15Sign::new::<sha2::Sha224>(),
                    a => panic!("mock cannot sign with hash {}", a),
                };
                let s = private.sign(scheme, &digest).unwrap();
                Sexp::List(vec![
                    Sexp::sym("sig-val"),
                    Sexp::List(vec![
                        Sexp::sym("rsa"),
                        Sexp::List(vec![Sexp::sym("s"), Sexp::bytes(&s)]),
                    ]),
                ])
            },
            MockKey::Ed25519(secret) => {
                use ed25519_dalek::Signer as _;
                let sig = secret.sign(&digest).to_bytes();
                Sexp::List(vec![
                    Sexp::sym("sig-val"),
                    Sexp::List(vec![
                        Sexp::sym("eddsa"),
                        Sexp::List(vec![Sexp::sym("r"),
                                        Sexp::bytes(&sig[..32])]),
                        Sexp::List(vec![Sexp::sym("s"),
                                        Sexp::bytes(&sig[32..])]),
                    ]),
                ])
            },
            MockKey::Ecdh => panic!("an encryption key cannot sign"),
        };
        drop(state);

        self.reply_data(&sig.to_vec());
        self.reply("OK");
    }

    fn finish_decrypt(&mut self, _ciphertext: &[u8]) {
        self.reply("S PADDING 0");
        self.reply_data(b"(5:value11:session-key)");
        self.reply("OK");
    }
}

fn public_key_sexp(mpis: &mpi::PublicKey) -> Sexp {
    fn param(name: &str, value: &[u8]) -> Sexp {
        Sexp::List(vec![Sexp::sym(name), Sexp::bytes(value)])
    }

    match mpis {
        mpi::PublicKey::RSA { n, e } => Sexp::List(vec![
            Sexp::sym("public-key"),
            Sexp::List(vec![
                Sexp::sym("rsa"),
                param("n", n.value()),
                param("e", e.value()),
            ]),
        ]),
        mpi::PublicKey::EdDSA { q, .. } => Sexp::List(vec![
            Sexp::sym("public-key"),
            Sexp::List(vec![
                Sexp::sym("ecc"),
                param("curve", b"Ed25519"),
                Sexp::List(vec![Sexp::sym("flags"), Sexp::sym("eddsa")]),
                param("q", q.value()),
            ]),
        ]),
        mpi::PublicKey::ECDH { q, .. } => Sexp::List(vec![
            Sexp::sym("public-key"),
            Sexp::List(vec![
                Sexp::sym("ecc"),
                param("curve", b"Curve25519"),
                param("q", q.value()),
            ]),
        ]),
        k => panic!("mock does not serve {:?}", k),
    }
}

impl Read for MockAgent {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = std::cmp::min(buf.len(), self.outbuf.len());
        for b in buf.iter_mut().take(n) {
            *b = self.outbuf.pop_front().unwrap();
        }
        Ok(n)
    }
}

impl Write for MockAgent {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inbuf.extend_from_slice(buf);
        while let Some(pos) = self.inbuf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.inbuf.drain(..=pos).collect();
            let line = String::from_utf8(line).unwrap();
            self.process_line(line);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn handshake() {
    let (mock, _) = MockAgent::new();
    let mut agent = Agent::new(mock).unwrap();
    assert!(!agent.hijacked());
    assert_eq!(agent.version().unwrap(), "2.1.6");

    let grip = madrone_openpgp::crypto::sexp::Keygrip::from([0u8; 20]);
    assert!(!agent.have_key(&[grip]).unwrap());
}

#[test]
fn hijack_detection() {
    let (mock, state) = MockAgent::new();
    state.borrow_mut().answer_agent_id = true;
    let agent = Agent::new(mock).unwrap();
    assert!(agent.hijacked());
}

#[test]
fn quick_generation_defaults() {
    let (mock, _) = MockAgent::new();
    let agent = Agent::new(mock).unwrap().shared();

    let mut params =
        KeyParameters::quick("Alice <alice@example.com>");
    params.no_protection = true;

    let mut out = Vec::new();
    let cert = keygen::generate(&agent, &params,
                                &StandardPolicy::new(),
                                &mut StatusWriter::new(&mut out))
        .unwrap().unwrap();

    // An RSA-2048 primary that can certify and sign ...
    let primary = cert.primary_key();
    assert_eq!(primary.algo_string(), "rsa2048");
    let uid = cert.userids().next().unwrap();
    let selfsig = uid.binding_signature().unwrap();
    assert_eq!(selfsig.typ(), SignatureType::PositiveCertification);
    assert_eq!(selfsig.key_flags().unwrap().bits(), 0x03);

    // ... carrying the default policy subpackets ...
    assert_eq!(selfsig.preferred_symmetric_algorithms().unwrap().iter()
               .map(|&a| u8::from(a)).collect::<Vec<_>>(),
               vec![9, 8, 7, 2]);
    assert_eq!(selfsig.preferred_hash_algorithms().unwrap().iter()
               .map(|&a| u8::from(a)).collect::<Vec<_>>(),
               vec![8, 9, 10, 11, 2]);
    assert_eq!(selfsig.preferred_compression_algorithms().unwrap().iter()
               .map(|&a| u8::from(a)).collect::<Vec<_>>(),
               vec![2, 3, 1]);
    assert_eq!(selfsig.features().unwrap().bits(), 0x01);

    // ... and an RSA-2048 encryption subkey bound without a back
    // signature.
    let binding = cert.subkeys().next().unwrap();
    assert_eq!(binding.key().algo_string(), "rsa2048");
    let bsig = binding.binding_signature().unwrap();
    assert_eq!(bsig.typ(), SignatureType::SubkeyBinding);
    assert_eq!(bsig.key_flags().unwrap().bits(), 0x0c);
    assert!(bsig.embedded_signature().is_none());

    // The subkey differs from the primary.
    assert!(binding.key().fingerprint() != primary.fingerprint());

    // The status line announces both keys.
    let status = String::from_utf8(out).unwrap();
    assert_eq!(status.trim(),
               format!("KEY_CREATED B {}", cert.fingerprint().to_hex()));

    // The whole thing round-trips.
    use madrone_openpgp::parse::Parse;
    use madrone_openpgp::serialize::SerializeInto;
    let buf = cert.to_vec().unwrap();
    assert_eq!(Cert::from_bytes(&buf).unwrap(), cert);
}

#[test]
fn parameter_file_ed25519_cv25519() {
    let input = "\
        %echo Generating a modern key\n\
        Key-Type: EDDSA\n\
        Key-Curve: Ed25519\n\
        Subkey-Type: ECDH\n\
        Subkey-Curve: Curve25519\n\
        Name-Real: Alice Lovelace\n\
        Name-Email: alice@example.org\n\
        Expire-Date: 0\n\
        %no-protection\n\
        %commit\n";
    let blocks = keygen::parse_parameter_file(input, |_| ()).unwrap();
    assert_eq!(blocks.len(), 1);

    let (mock, _) = MockAgent::new();
    let agent = Agent::new(mock).unwrap().shared();
    let mut out = Vec::new();
    let cert = keygen::generate(&agent, &blocks[0],
                                &StandardPolicy::new(),
                                &mut StatusWriter::new(&mut out))
        .unwrap().unwrap();

    let primary = cert.primary_key();
    assert_eq!(primary.algo_string(), "ed25519");

    // The client and the mock agree on the keygrip: the agent finds
    // the secret key under the grip the client derives.
    let grip = primary.keygrip().unwrap();
    assert!(agent.borrow_mut().have_key(&[grip]).unwrap());

    // The ECDH subkey is encryption only: bound, but without a back
    // signature.
    let binding = cert.subkeys().next().unwrap();
    assert_eq!(binding.key().algo_string(), "cv25519");
    let bsig = binding.binding_signature().unwrap();
    assert_eq!(bsig.key_flags().unwrap().bits(), 0x0c);
    assert!(bsig.embedded_signature().is_none());
    assert!(!binding.missing_cross_cert());
}

#[test]
fn signing_subkey_gets_back_signature() {
    let input = "\
        Key-Type: RSA\n\
        Key-Length: 2048\n\
        Subkey-Type: EDDSA\n\
        Subkey-Curve: Ed25519\n\
        Subkey-Usage: sign\n\
        Name-Email: sig@example.org\n\
        %no-protection\n\
        %commit\n";
    let blocks = keygen::parse_parameter_file(input, |_| ()).unwrap();

    let (mock, state) = MockAgent::new();
    let agent = Agent::new(mock).unwrap().shared();
    let mut out = Vec::new();
    let cert = keygen::generate(&agent, &blocks[0],
                                &StandardPolicy::new(),
                                &mut StatusWriter::new(&mut out))
        .unwrap().unwrap();

    // The binding embeds a back signature issued by the subkey.
    let binding = cert.subkeys().next().unwrap();
    assert!(!binding.missing_cross_cert());
    let bsig = binding.binding_signature().unwrap();
    let backsig = bsig.embedded_signature().unwrap();
    assert_eq!(backsig.typ(), SignatureType::PrimaryKeyBinding);
    backsig.verify_primary_key_binding(cert.primary_key(),
                                       binding.key()).unwrap();

    // The second GENKEY reused the cache nonce from the first, so
    // the passphrase is not prompted for twice.
    let lines = state.borrow().genkey_lines.clone();
    assert_eq!(lines.len(), 2);
    assert!(!lines[0].contains("4E6F6E6365"));
    assert!(lines[1].contains("4E6F6E6365"));
}

#[test]
fn failed_generation_reports_status() {
    let (mock, state) = MockAgent::new();
    state.borrow_mut().fail_genkey = true;
    let agent = Agent::new(mock).unwrap().shared();

    let mut params = KeyParameters::quick("x@example.org");
    params.no_protection = true;
    params.handle = Some("job-1".into());

    let mut out = Vec::new();
    let err = keygen::generate(&agent, &params,
                               &StandardPolicy::new(),
                               &mut StatusWriter::new(&mut out))
        .unwrap_err();
    match err.downcast_ref::<Error>() {
        Some(Error::Canceled) => (),
        e => panic!("unexpected error {:?}", e),
    }

    // The failure is paired with the structured status line.
    let status = String::from_utf8(out).unwrap();
    assert_eq!(status.trim(), "KEY_NOT_CREATED job-1");
}

#[test]
fn decrypt_flow() {
    let (mock, _) = MockAgent::new();
    let agent = Agent::new(mock).unwrap().shared();

    // Generate a key so the mock knows a grip.
    let mut params = KeyParameters::quick("x@example.org");
    params.subkey = None;
    params.no_protection = true;
    let mut out = Vec::new();
    let cert = keygen::generate(&agent, &params,
                                &StandardPolicy::new(),
                                &mut StatusWriter::new(&mut out))
        .unwrap().unwrap();

    let grip = cert.primary_key().keygrip().unwrap();
    let ciphertext = Sexp::List(vec![
        Sexp::sym("enc-val"),
        Sexp::List(vec![
            Sexp::sym("rsa"),
            Sexp::List(vec![Sexp::sym("a"), Sexp::bytes(b"junk")]),
        ]),
    ]);

    let (plaintext, padding) = agent.borrow_mut()
        .decrypt(&grip, Some("test key"), &ciphertext).unwrap();
    assert_eq!(&plaintext[..], b"session-key");
    assert_eq!(padding, Some(0));
}
