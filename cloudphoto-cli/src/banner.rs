const USAGE: &str = "\
-------------------------------------------------------------------------------------------
CLOUDPHOTO(1)                                                                 CLOUDPHOTO(1)

NAME:
       cloudphoto - CLI for Amazon S3 photo albums
SYNOPSIS:
       cloudphoto  COMMAND [OPTION]... [ARG]...
DESCRIPTION:
       cloudphoto is a client for interacting with the Amazon S3 object storage.
       Albums are kept as object tags. The commands are listed below.
OPTIONS:
       -p      path of directory
       -a      album name
COMMANDS:
       upload      upload files from a directory to object storage under an album
       download    download the files of an album from object storage to a directory
       list        list albums, or the images of one album
       exit        quit from program
EXAMPLES:
       upload      cloudphoto upload -p /home/username/photos/ -a holiday
       download    cloudphoto download -p /home/username/downloads/ -a holiday
       list        cloudphoto list -a holiday
                   cloudphoto list
       exit        cloudphoto exit
-------------------------------------------------------------------------------------------";

pub fn print() {
    println!("{USAGE}");
}
