//! Simple trajectory listener
//!
//! Binds to a local address and prints every trajectory frame received from `traj_exec`.

use comms_if::net::TrajSocket;
use comms_if::traj::{self, StartCommand, StopCommand, TrajectoryRecord, Wire};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "test_traj_sub")]
struct Opts {
    /// Local address to listen on
    #[structopt(default_value = "127.0.0.1:6000")]
    bind_addr: String,

    /// Print records as JSON instead of a summary line
    #[structopt(long)]
    json: bool
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opts = Opts::from_args();

    let socket = TrajSocket::bind(&opts.bind_addr)?;
    println!("Listening on {:?}", socket.local_addr());

    loop {
        let (header, payload) = match socket.recv_frame() {
            Ok(f) => f,
            Err(e) => {
                println!("Bad frame: {}", e);
                continue;
            }
        };

        match payload.len() {
            l if l == StartCommand::LEN => {
                let cmd = StartCommand::parse(&payload)?;
                println!("[{}] START {:?}", header.frame_number, cmd);
            },
            l if l == StopCommand::LEN => {
                StopCommand::parse(&payload)?;
                println!("[{}] STOP", header.frame_number);
                break;
            },
            l if l % TrajectoryRecord::LEN == 0 => {
                for rec in traj::decode_records(&payload)? {
                    if opts.json {
                        println!("{}", serde_json::to_string(&rec)?);
                    }
                    else {
                        println!(
                            "[{}] id {} seq {} t {:.3} pos {:?}", 
                            header.frame_number, rec.traj_id, rec.seq_num, rec.traj_time_s, 
                            rec.pos_m
                        );
                    }
                }
            },
            l => println!("[{}] Unknown payload of {} bytes", header.frame_number, l)
        }
    }

    Ok(())
}
